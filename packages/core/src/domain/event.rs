//! Conversation change notifications.

use super::{
    entity::{Message, MessageStatus},
    value_object::{Epoch, MessageId, ParticipantId},
};

/// Why a typing indicator went away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingStopReason {
    /// Cleared explicitly, usually because the reply arrived
    Cleared,
    /// The auto-clear timer fired first
    Expired,
}

/// Every observable change of a conversation session.
///
/// Published on a broadcast bus; renderers and the scroll controller
/// subscribe to it instead of polling the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    MessageAppended(Message),
    StatusChanged {
        id: MessageId,
        from: MessageStatus,
        to: MessageStatus,
    },
    TypingStarted {
        participant: ParticipantId,
    },
    TypingStopped {
        participant: ParticipantId,
        reason: TypingStopReason,
    },
    ConversationReset {
        epoch: Epoch,
    },
}
