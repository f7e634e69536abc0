//! Outbound chat boundary.
//!
//! The remote chat API is opaque to the core; the dispatcher only sees this
//! trait. The HTTP implementation lives in `infrastructure::gateway`.

use async_trait::async_trait;
use serde::Serialize;

use super::{
    error::ChatFailure,
    value_object::{ConversationId, ParticipantId},
};

/// Context about the human side of the conversation, forwarded verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserContext {
    pub conversation_id: ConversationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
}

impl UserContext {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            user_name: None,
            user_role: None,
        }
    }

    pub fn with_user(mut self, name: Option<String>, role: Option<String>) -> Self {
        self.user_name = name;
        self.user_role = role;
        self
    }
}

/// One outbound call: the user's text addressed to one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub participant_id: ParticipantId,
    pub user_context: UserContext,
}

/// Successful reply payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// Optional display name override sent back by the API
    pub display_name: Option<String>,
}

impl ChatReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            display_name: None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send(&self, request: ChatRequest) -> Result<ChatReply, ChatFailure>;
}
