//! Chat API request/response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::UserContext;

/// Body of `POST {endpoint}`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequestDto<'a> {
    pub message: &'a str,
    pub agent_id: &'a str,
    pub user_context: &'a UserContext,
}

/// Success payload. `reply` and `content` are accepted for `response`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseDto {
    #[serde(alias = "reply", alias = "content")]
    pub response: String,
    #[serde(default, alias = "name")]
    pub agent_name: Option<String>,
}
