//! Typing-state tracker.
//!
//! Keeps at most one "is typing" entry per participant, each guarded by a
//! tokio timer that clears it automatically. Replacing an entry aborts the
//! previous timer, and every timer carries a token so a timer that already
//! woke up cannot clear an entry it no longer owns.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, broadcast},
    task::JoinHandle,
    time::Instant,
};

use crate::domain::{ConversationEvent, Epoch, ParticipantId, TypingStopReason};

struct TypingEntry {
    started_at: Instant,
    token: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct TypingState {
    entries: HashMap<ParticipantId, TypingEntry>,
    next_token: u64,
    epoch: Epoch,
}

/// Per-participant typing indicators with auto-expiry
pub struct TypingTracker {
    state: Arc<Mutex<TypingState>>,
    events: broadcast::Sender<ConversationEvent>,
}

impl TypingTracker {
    pub fn new(events: broadcast::Sender<ConversationEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TypingState::default())),
            events,
        }
    }

    pub async fn epoch(&self) -> Epoch {
        self.state.lock().await.epoch
    }

    /// Mark `participant` as typing for at most `duration`.
    ///
    /// Calling it again before expiry restarts the countdown; the previous
    /// timer is cancelled.
    pub async fn set_typing(&self, participant: ParticipantId, duration: Duration) {
        let mut state = self.state.lock().await;
        self.start_locked(&mut state, participant, duration);
    }

    /// [`TypingTracker::set_typing`] scoped to `epoch`; ignored after a reset.
    pub async fn set_typing_in(
        &self,
        epoch: Epoch,
        participant: ParticipantId,
        duration: Duration,
    ) -> bool {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!("Not marking '{}' as typing: stale epoch {}", participant, epoch);
            return false;
        }
        self.start_locked(&mut state, participant, duration);
        true
    }

    /// Remove the entry and cancel its timer. No-op when absent.
    pub async fn clear_typing(&self, participant: &ParticipantId) {
        let mut state = self.state.lock().await;
        self.clear_locked(&mut state, participant);
    }

    /// [`TypingTracker::clear_typing`] scoped to `epoch`; ignored after a reset.
    pub async fn clear_typing_in(&self, epoch: Epoch, participant: &ParticipantId) -> bool {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return false;
        }
        self.clear_locked(&mut state, participant)
    }

    pub async fn is_typing(&self, participant: &ParticipantId) -> bool {
        self.state.lock().await.entries.contains_key(participant)
    }

    /// Everyone currently typing, earliest first.
    pub async fn typing_participants(&self) -> Vec<ParticipantId> {
        let state = self.state.lock().await;
        let mut typing: Vec<_> = state
            .entries
            .iter()
            .map(|(id, entry)| (entry.started_at, id.clone()))
            .collect();
        typing.sort();
        typing.into_iter().map(|(_, id)| id).collect()
    }

    /// Cancel every timer, drop every entry and start a new epoch.
    pub async fn reset(&self) -> Epoch {
        let mut state = self.state.lock().await;
        for (_, entry) in state.entries.drain() {
            entry.timer.abort();
        }
        state.epoch = state.epoch.next();
        state.epoch
    }

    fn start_locked(&self, state: &mut TypingState, participant: ParticipantId, duration: Duration) {
        state.next_token += 1;
        let token = state.next_token;
        let timer = self.spawn_expiry(participant.clone(), token, duration);
        let entry = TypingEntry {
            started_at: Instant::now(),
            token,
            timer,
        };

        match state.entries.insert(participant.clone(), entry) {
            Some(previous) => {
                previous.timer.abort();
                tracing::debug!("Restarted typing timer for '{}'", participant);
            }
            None => {
                let _ = self
                    .events
                    .send(ConversationEvent::TypingStarted { participant });
            }
        }
    }

    fn clear_locked(&self, state: &mut TypingState, participant: &ParticipantId) -> bool {
        let Some(entry) = state.entries.remove(participant) else {
            return false;
        };
        entry.timer.abort();
        let _ = self.events.send(ConversationEvent::TypingStopped {
            participant: participant.clone(),
            reason: TypingStopReason::Cleared,
        });
        true
    }

    fn spawn_expiry(&self, participant: ParticipantId, token: u64, duration: Duration) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut state = state.lock().await;
            let owned = state
                .entries
                .get(&participant)
                .is_some_and(|entry| entry.token == token);
            if !owned {
                return;
            }
            state.entries.remove(&participant);
            tracing::debug!("Typing indicator for '{}' expired", participant);
            let _ = events.send(ConversationEvent::TypingStopped {
                participant,
                reason: TypingStopReason::Expired,
            });
        })
    }
}
