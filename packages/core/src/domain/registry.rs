//! Participant registry and the active participant set.

use std::collections::HashMap;

use super::{entity::Participant, error::RegistryError, value_object::ParticipantId};

/// Built-in roster: (id, name, role, avatar)
const DEFAULT_ROSTER: &[(&str, &str, &str, &str)] = &[
    ("sarah", "Sarah Chen", "Product Manager", "👩‍💼"),
    ("alex", "Alex Rivera", "Senior Engineer", "👨‍💻"),
    ("maya", "Maya Patel", "UX Designer", "🎨"),
    ("jordan", "Jordan Kim", "Data Analyst", "📊"),
    ("priya", "Priya Shah", "Engineering Manager", "🧭"),
];

/// Static mapping from participant id to display metadata.
///
/// Immutable once built; iteration follows registration order.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
    index: HashMap<ParticipantId, usize>,
}

impl ParticipantRegistry {
    /// Build a registry from an explicit roster.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateParticipant` if two entries share an id.
    pub fn from_participants(participants: Vec<Participant>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(participants.len());
        for (position, participant) in participants.iter().enumerate() {
            if index.insert(participant.id.clone(), position).is_some() {
                return Err(RegistryError::DuplicateParticipant(participant.id.clone()));
            }
        }
        Ok(Self {
            participants,
            index,
        })
    }

    /// The built-in team of simulated colleagues.
    pub fn with_defaults() -> Self {
        let participants = DEFAULT_ROSTER
            .iter()
            .filter_map(|(id, name, role, avatar)| {
                ParticipantId::try_from(*id)
                    .ok()
                    .map(|id| Participant::new(id, *name, *role, *avatar))
            })
            .collect::<Vec<_>>();
        let index = participants
            .iter()
            .enumerate()
            .map(|(position, p)| (p.id.clone(), position))
            .collect();
        Self {
            participants,
            index,
        }
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.index.get(id).map(|&position| &self.participants[position])
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Validate `ids` against the registry and build an active set.
    ///
    /// Duplicates are collapsed, first occurrence wins.
    pub fn resolve_active(
        &self,
        ids: impl IntoIterator<Item = ParticipantId>,
    ) -> Result<ActiveParticipants, RegistryError> {
        let mut active = ActiveParticipants::default();
        for id in ids {
            if !self.contains(&id) {
                return Err(RegistryError::UnknownParticipant(id));
            }
            active.select(id);
        }
        Ok(active)
    }
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Ordered, duplicate-free set of participants addressed by the next send.
///
/// The order is the dispatch order: index `i` gets the `i`-th stagger slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveParticipants(Vec<ParticipantId>);

impl ActiveParticipants {
    pub fn ids(&self) -> &[ParticipantId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.0.contains(id)
    }

    /// Add at the end. Returns `false` if already present.
    pub fn select(&mut self, id: ParticipantId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Remove, keeping the relative order of the rest. Returns `false` if absent.
    pub fn deselect(&mut self, id: &ParticipantId) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != before
    }
}
