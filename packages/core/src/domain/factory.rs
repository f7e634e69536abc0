//! Domain factories for creating domain entities and value objects.

use super::ConversationId;

/// Factory for generating ConversationId instances.
pub struct ConversationIdFactory;

impl ConversationIdFactory {
    /// Generate a new ConversationId with a random UUID v4.
    pub fn generate() -> ConversationId {
        ConversationId::from_uuid(uuid::Uuid::new_v4())
    }
}
