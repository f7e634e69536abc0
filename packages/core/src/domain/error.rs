//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::{MessageId, ParticipantId};
use super::entity::MessageStatus;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ParticipantId validation error
    #[error("ParticipantId cannot be empty")]
    ParticipantIdEmpty,

    /// ParticipantId too long error
    #[error("ParticipantId cannot exceed {max} characters (got {actual})")]
    ParticipantIdTooLong { max: usize, actual: usize },

    /// ParticipantId contains characters outside `[a-z0-9_-]`
    #[error("ParticipantId may only contain lowercase letters, digits, '-' and '_' (got: {0})")]
    ParticipantIdInvalidFormat(String),

    /// MessageBody validation error
    #[error("MessageBody cannot be empty")]
    MessageBodyEmpty,

    /// MessageBody too long error
    #[error("MessageBody cannot exceed {max} characters (got {actual})")]
    MessageBodyTooLong { max: usize, actual: usize },

    /// ConversationId invalid format error (not a valid UUID format)
    #[error("ConversationId must be a valid UUID format (got: {0})")]
    ConversationIdInvalidFormat(String),
}

/// Errors raised by the message log when a mutation is refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageLogError {
    #[error("message {0} not found")]
    NotFound(MessageId),

    #[error("message {id}: status transition {from:?} -> {to:?} is not allowed")]
    InvalidTransition {
        id: MessageId,
        from: MessageStatus,
        to: MessageStatus,
    },
}

/// Errors related to participant lookup and selection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown participant '{0}'")]
    UnknownParticipant(ParticipantId),

    #[error("participant '{0}' is registered twice")]
    DuplicateParticipant(ParticipantId),
}

/// Failure category of an outbound chat call.
///
/// Every category maps to a fixed human-readable fallback that is shown in
/// the transcript as if the participant had written it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// HTTP 422
    InvalidFormat,
    /// HTTP 404
    ParticipantUnavailable,
    /// HTTP 500
    Backend,
    /// The request never produced a response
    Transport,
    /// Any other non-success outcome
    Unknown,
}

impl FailureKind {
    pub fn fallback_text(self) -> &'static str {
        match self {
            FailureKind::InvalidFormat => {
                "I couldn't quite process that message format. Could you try rephrasing it?"
            }
            FailureKind::ParticipantUnavailable => {
                "I'm not available right now. Try reaching out to someone else on the team."
            }
            FailureKind::Backend => {
                "I'm having some technical difficulties at the moment. Please try again shortly."
            }
            FailureKind::Transport => {
                "I'm unable to connect right now. Please check your connection and try again."
            }
            FailureKind::Unknown => "Sorry, there was a connection issue. Please try again.",
        }
    }
}

/// Outcome of a failed outbound chat call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatFailure {
    #[error("request rejected as malformed (422): {0}")]
    InvalidFormat(String),

    #[error("participant not found (404): {0}")]
    ParticipantUnavailable(String),

    #[error("backend failure (500): {0}")]
    Backend(String),

    #[error("unexpected status {status}: {body}")]
    Unexpected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("empty reply")]
    EmptyReply,

    /// 2xx JSON body with no reply text in it
    #[error("reply without text: {0}")]
    MalformedReply(String),
}

impl ChatFailure {
    /// Classify an HTTP status + body into a failure.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            422 => ChatFailure::InvalidFormat(body),
            404 => ChatFailure::ParticipantUnavailable(body),
            500 => ChatFailure::Backend(body),
            _ => ChatFailure::Unexpected { status, body },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ChatFailure::InvalidFormat(_) => FailureKind::InvalidFormat,
            ChatFailure::ParticipantUnavailable(_) => FailureKind::ParticipantUnavailable,
            ChatFailure::Backend(_) => FailureKind::Backend,
            ChatFailure::Transport(_) => FailureKind::Transport,
            ChatFailure::Unexpected { .. }
            | ChatFailure::EmptyReply
            | ChatFailure::MalformedReply(_) => FailureKind::Unknown,
        }
    }
}
