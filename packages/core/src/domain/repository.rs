//! Repository trait for the message store.
//!
//! The use case depends on this trait only; the in-memory implementation
//! lives in the infrastructure layer.

use async_trait::async_trait;

use super::{
    entity::{Message, MessageStatus, NewMessage},
    value_object::{Epoch, MessageId},
};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append to the current conversation.
    async fn append(&self, draft: NewMessage) -> MessageId;

    /// Append only if `epoch` is still current; `None` means the write was dropped.
    async fn append_in(&self, epoch: Epoch, draft: NewMessage) -> Option<MessageId>;

    /// Move a message forward in its lifecycle.
    ///
    /// Unknown ids and disallowed transitions are silent no-ops; the return
    /// value only says whether anything changed.
    async fn update_status(&self, id: MessageId, status: MessageStatus) -> bool;

    async fn get(&self, id: MessageId) -> Option<Message>;

    /// Ordered snapshot of the whole conversation.
    async fn all(&self) -> Vec<Message>;

    async fn len(&self) -> usize;

    async fn epoch(&self) -> Epoch;

    /// Clear the conversation and return the new epoch.
    async fn reset(&self) -> Epoch;
}
