//! HTTP chat gateway backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::{ChatFailure, ChatGateway, ChatReply, ChatRequest},
    infrastructure::dto::http::{ChatRequestDto, ChatResponseDto},
};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach the chat API
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Sends one JSON POST per participant call.
///
/// 2xx bodies are read as [`ChatResponseDto`]; a 2xx body that is not JSON at
/// all is taken verbatim as the reply text, while JSON without a reply string
/// is a [`ChatFailure::MalformedReply`]. Non-2xx statuses are classified with
/// [`ChatFailure::from_status`] whether or not their body can be read.
/// Anything that fails before a status is received, or while reading a 2xx
/// body, is a transport failure.
pub struct HttpChatGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpChatGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl ChatGateway for HttpChatGateway {
    async fn send(&self, request: ChatRequest) -> Result<ChatReply, ChatFailure> {
        let body = ChatRequestDto {
            message: &request.message,
            agent_id: request.participant_id.as_str(),
            user_context: &request.user_context,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(
                "Chat API returned {} for '{}'",
                status,
                request.participant_id
            );
            let detail = response.text().await.unwrap_or_default();
            return Err(ChatFailure::from_status(status.as_u16(), detail));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ChatFailure::Transport(e.to_string()))?;
        let reply = parse_reply(text)?;

        if reply.text.trim().is_empty() {
            return Err(ChatFailure::EmptyReply);
        }
        Ok(reply)
    }
}

fn parse_reply(text: String) -> Result<ChatReply, ChatFailure> {
    let value = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => value,
        Err(_) => return Ok(ChatReply::new(text)),
    };
    match value {
        serde_json::Value::String(reply) => Ok(ChatReply::new(reply)),
        value @ serde_json::Value::Object(_) => serde_json::from_value::<ChatResponseDto>(value)
            .map(|dto| ChatReply {
                text: dto.response,
                display_name: dto.agent_name,
            })
            .map_err(|e| {
                tracing::debug!("Chat API reply has no usable text: {}", e);
                ChatFailure::MalformedReply(text)
            }),
        _ => Err(ChatFailure::MalformedReply(text)),
    }
}
