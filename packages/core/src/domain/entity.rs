//! Core domain models for the conversation.

use serde::{Deserialize, Serialize};

use super::{
    error::{FailureKind, MessageLogError},
    value_object::{Epoch, MessageBody, MessageId, ParticipantId, Timestamp},
};

/// A simulated colleague the user can talk to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier, also used as `agent_id` on the wire
    pub id: ParticipantId,
    /// Display name, e.g. "Sarah Chen"
    pub name: String,
    /// Role label, e.g. "Product Manager"
    pub role: String,
    /// Avatar glyph rendered next to the name
    pub avatar: String,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        name: impl Into<String>,
        role: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role: role.into(),
            avatar: avatar.into(),
        }
    }
}

/// Who wrote a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Author {
    User,
    Participant(ParticipantId),
}

impl Author {
    pub fn participant_id(&self) -> Option<&ParticipantId> {
        match self {
            Author::User => None,
            Author::Participant(id) => Some(id),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Author::User)
    }
}

/// Delivery status of a message.
///
/// `Sending → Sent → Delivered → Read` moves strictly forward; skipping ahead
/// is allowed. `Failed` is terminal and only reachable before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: MessageStatus) -> bool {
        use MessageStatus::*;
        matches!(
            (self, next),
            (Sending, Sent | Delivered | Read | Failed)
                | (Sent, Delivered | Read | Failed)
                | (Delivered, Read)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Read | MessageStatus::Failed)
    }
}

/// Represents a message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub body: MessageBody,
    pub created_at: Timestamp,
    pub status: MessageStatus,
    /// For replies: the user message being answered
    pub correlation_id: Option<MessageId>,
    /// Display name override returned by the chat API
    pub display_name: Option<String>,
    /// Set when the body is a fallback for a failed call
    pub failure: Option<FailureKind>,
}

/// A message that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub author: Author,
    pub body: MessageBody,
    pub created_at: Timestamp,
    pub status: MessageStatus,
    pub correlation_id: Option<MessageId>,
    pub display_name: Option<String>,
    pub failure: Option<FailureKind>,
}

impl NewMessage {
    /// Optimistic user message, starts as `Sending`
    pub fn from_user(body: MessageBody, created_at: Timestamp) -> Self {
        Self {
            author: Author::User,
            body,
            created_at,
            status: MessageStatus::Sending,
            correlation_id: None,
            display_name: None,
            failure: None,
        }
    }

    /// Participant reply, starts as `Delivered`
    pub fn reply(
        participant: ParticipantId,
        body: MessageBody,
        in_reply_to: MessageId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            author: Author::Participant(participant),
            body,
            created_at,
            status: MessageStatus::Delivered,
            correlation_id: Some(in_reply_to),
            display_name: None,
            failure: None,
        }
    }

    /// Fallback reply for a failed call. The fallback itself counts as delivered.
    pub fn fallback(
        participant: ParticipantId,
        kind: FailureKind,
        in_reply_to: MessageId,
        created_at: Timestamp,
    ) -> Self {
        let body = MessageBody::from_trusted(kind.fallback_text());
        Self {
            author: Author::Participant(participant),
            body,
            created_at,
            status: MessageStatus::Delivered,
            correlation_id: Some(in_reply_to),
            display_name: None,
            failure: Some(kind),
        }
    }

    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name.filter(|name| !name.trim().is_empty());
        self
    }
}

/// Append-only, ordered record of one conversation.
///
/// Positions never change once appended; only the status of a message can be
/// moved, and only forward. Ids keep increasing across [`MessageLog::reset`].
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,
    epoch: Epoch,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Append to the end of the log, assigning the next id.
    pub fn append(&mut self, draft: NewMessage) -> &Message {
        self.next_id += 1;
        let message = Message {
            id: MessageId::new(self.next_id),
            author: draft.author,
            body: draft.body,
            created_at: draft.created_at,
            status: draft.status,
            correlation_id: draft.correlation_id,
            display_name: draft.display_name,
            failure: draft.failure,
        };
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Append only if `epoch` is still the current one.
    pub fn append_in(&mut self, epoch: Epoch, draft: NewMessage) -> Option<&Message> {
        if epoch != self.epoch {
            return None;
        }
        Some(self.append(draft))
    }

    /// Move a message to `status`, returning the previous status.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids (including ids from before a reset) and
    /// `InvalidTransition` for anything the lifecycle forbids.
    pub fn update_status(
        &mut self,
        id: MessageId,
        status: MessageStatus,
    ) -> Result<MessageStatus, MessageLogError> {
        let index = self.position(id).ok_or(MessageLogError::NotFound(id))?;
        let message = &mut self.messages[index];
        let from = message.status;
        if !from.can_transition_to(status) {
            return Err(MessageLogError::InvalidTransition {
                id,
                from,
                to: status,
            });
        }
        message.status = status;
        Ok(from)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.position(id).map(|index| &self.messages[index])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every message and start a new epoch.
    pub fn reset(&mut self) -> Epoch {
        self.messages.clear();
        self.epoch = self.epoch.next();
        self.epoch
    }

    // Ids are strictly increasing along the vector.
    fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.binary_search_by_key(&id, |m| m.id).ok()
    }
}
