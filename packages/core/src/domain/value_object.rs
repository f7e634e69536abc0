//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Maximum length of a participant identifier
pub const PARTICIPANT_ID_MAX_LEN: usize = 64;

/// Maximum length (in characters) of a message body
pub const MESSAGE_BODY_MAX_LEN: usize = 10_000;

/// Participant identifier value object.
///
/// Stable handle of a simulated colleague, e.g. `sarah`. Restricted to
/// lowercase ascii letters, digits, `-` and `_` so it can be used verbatim
/// as the `agent_id` of the outbound chat call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a new ParticipantId.
    ///
    /// # Errors
    ///
    /// Fails when the id is empty, longer than [`PARTICIPANT_ID_MAX_LEN`] or
    /// contains characters outside `[a-z0-9_-]`.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::ParticipantIdEmpty);
        }
        let len = id.chars().count();
        if len > PARTICIPANT_ID_MAX_LEN {
            return Err(ValueObjectError::ParticipantIdTooLong {
                max: PARTICIPANT_ID_MAX_LEN,
                actual: len,
            });
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(ValueObjectError::ParticipantIdInvalidFormat(id));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl From<ParticipantId> for String {
    fn from(value: ParticipantId) -> Self {
        value.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier value object.
///
/// Assigned by the message log. Strictly increasing in creation order and
/// never reused, including across conversation resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Message body value object.
///
/// Never blank; at most [`MESSAGE_BODY_MAX_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageBody(String);

impl MessageBody {
    /// Create a new MessageBody, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `MessageBodyEmpty` for blank input and `MessageBodyTooLong`
    /// above the size limit.
    pub fn new(content: impl AsRef<str>) -> Result<Self, ValueObjectError> {
        let trimmed = content.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::MessageBodyEmpty);
        }
        let len = trimmed.chars().count();
        if len > MESSAGE_BODY_MAX_LEN {
            return Err(ValueObjectError::MessageBodyTooLong {
                max: MESSAGE_BODY_MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Like [`MessageBody::new`] but cuts oversized input at the size limit
    /// instead of rejecting it. Used for replies we do not control.
    pub fn truncated(content: impl AsRef<str>) -> Result<Self, ValueObjectError> {
        let trimmed = content.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::MessageBodyEmpty);
        }
        Ok(Self(trimmed.chars().take(MESSAGE_BODY_MAX_LEN).collect()))
    }

    // Fixed texts known to satisfy the invariants.
    pub(crate) fn from_trusted(content: &'static str) -> Self {
        Self(content.to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters (not bytes).
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MessageBody> for String {
    fn from(value: MessageBody) -> Self {
        value.0
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Wall-clock now.
    pub fn now() -> Self {
        Self(huddle_shared::time::now_millis())
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation generation.
///
/// Bumped on every reset. Work started in one epoch must not write into a
/// later one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation identifier value object (UUID string).
///
/// Sent to the remote chat API as part of the user context so the backend
/// can keep per-conversation memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    /// Parse a ConversationId from a UUID string.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        uuid::Uuid::parse_str(&id)
            .map(Self::from_uuid)
            .map_err(|_| ValueObjectError::ConversationIdInvalidFormat(id))
    }

    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
