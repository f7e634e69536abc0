//! JSON transcript export.

use std::path::Path;

use huddle_core::domain::{
    Author, ConversationId, FailureKind, Message, MessageStatus, Participant, ParticipantRegistry,
};
use huddle_shared::time::timestamp_to_rfc3339;
use serde::Serialize;

use crate::error::ClientError;

#[derive(Debug, Serialize)]
pub struct Transcript {
    pub conversation_id: ConversationId,
    pub exported_at: String,
    pub participants: Vec<Participant>,
    pub messages: Vec<TranscriptEntry>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptEntry {
    pub id: u64,
    pub author: Author,
    pub name: String,
    pub body: String,
    pub status: MessageStatus,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl Transcript {
    pub fn new(
        conversation_id: ConversationId,
        registry: &ParticipantRegistry,
        messages: &[Message],
    ) -> Self {
        Self {
            conversation_id,
            exported_at: chrono::Utc::now().to_rfc3339(),
            participants: registry.iter().cloned().collect(),
            messages: messages
                .iter()
                .map(|message| TranscriptEntry::new(message, registry))
                .collect(),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ClientError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Transcript written to {}", path.display());
        Ok(())
    }
}

impl TranscriptEntry {
    fn new(message: &Message, registry: &ParticipantRegistry) -> Self {
        Self {
            id: message.id.value(),
            author: message.author.clone(),
            name: author_name(message, registry),
            body: message.body.as_str().to_string(),
            status: message.status,
            created_at: timestamp_to_rfc3339(message.created_at.value()),
            in_reply_to: message.correlation_id.map(|id| id.value()),
            failure: message.failure,
        }
    }
}

/// Display name for `message`: the reply's override, then the roster name,
/// then the raw id.
pub fn author_name(message: &Message, registry: &ParticipantRegistry) -> String {
    match &message.author {
        Author::User => "You".to_string(),
        Author::Participant(id) => message
            .display_name
            .clone()
            .or_else(|| registry.get(id).map(|p| p.name.clone()))
            .unwrap_or_else(|| id.to_string()),
    }
}
