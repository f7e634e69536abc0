//! Conversation session.
//!
//! One [`ConversationSession`] is one conversation: it owns the message store,
//! the typing tracker, the dispatcher, the active participant set and the
//! event bus everything publishes on. Nothing here is global; a client that
//! wants two conversations builds two sessions.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};

use crate::{
    domain::{
        ActiveParticipants, ChatGateway, ConversationEvent, ConversationId, ConversationIdFactory,
        Epoch, Message, MessageRepository, Participant, ParticipantId, ParticipantRegistry,
        RegistryError, UserContext,
    },
    infrastructure::{InMemoryMessageRepository, TypingTracker},
    usecase::{Dispatch, PacingPolicy, SendMessageError, SendMessageUseCase},
};

/// Capacity of the event bus. Slow subscribers see `Lagged` past this.
pub const EVENT_BUS_CAPACITY: usize = 1024;

/// Shared application state for one conversation
pub struct ConversationSession {
    /// 変更通知チャンネル（Repository と TypingTracker が共有）
    events: broadcast::Sender<ConversationEvent>,
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
    typing: Arc<TypingTracker>,
    dispatcher: SendMessageUseCase,
    registry: ParticipantRegistry,
    active: Mutex<ActiveParticipants>,
    user_context: Mutex<UserContext>,
    /// Held by `send` while it captures epochs and by `reset` throughout
    lifecycle: Mutex<()>,
}

impl ConversationSession {
    /// Build a session over an in-memory store.
    ///
    /// The active set starts empty and a fresh conversation id is generated.
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        pacing: Arc<dyn PacingPolicy>,
        registry: ParticipantRegistry,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let repository: Arc<dyn MessageRepository> =
            Arc::new(InMemoryMessageRepository::new(events.clone()));
        let typing = Arc::new(TypingTracker::new(events.clone()));
        let dispatcher = SendMessageUseCase::new(
            Arc::clone(&repository),
            Arc::clone(&typing),
            gateway,
            pacing,
        );

        Self {
            events,
            repository,
            typing,
            dispatcher,
            registry,
            active: Mutex::new(ActiveParticipants::default()),
            user_context: Mutex::new(UserContext::new(ConversationIdFactory::generate())),
            lifecycle: Mutex::new(()),
        }
    }

    /// Name and role forwarded to the chat API with every request.
    pub async fn set_user(&self, name: Option<String>, role: Option<String>) {
        let mut context = self.user_context.lock().await;
        *context = context.clone().with_user(name, role);
    }

    /// Send `text` to every active participant.
    ///
    /// The user message is in the store when this returns; replies arrive
    /// later as [`ConversationEvent`]s. A send never straddles a reset: it
    /// lands entirely before or entirely after it.
    pub async fn send(&self, text: &str) -> Result<Dispatch, SendMessageError> {
        let _lifecycle = self.lifecycle.lock().await;
        let active = self.active.lock().await.clone();
        let context = self.user_context.lock().await.clone();
        self.dispatcher.execute(text, &active, &context).await
    }

    /// Clear every message and typing indicator and start a new conversation.
    ///
    /// Requests still in flight are not aborted; whatever they write later is
    /// discarded. The active set and the user's name survive a reset.
    pub async fn reset(&self) -> Epoch {
        let _lifecycle = self.lifecycle.lock().await;
        let epoch = self.repository.reset().await;
        self.typing.reset().await;

        let mut context = self.user_context.lock().await;
        context.conversation_id = ConversationIdFactory::generate();
        tracing::info!(
            "Conversation reset (epoch {}), new conversation id {}",
            epoch,
            context.conversation_id
        );
        epoch
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.repository.all().await
    }

    /// Participants currently typing, earliest first.
    pub async fn typing(&self) -> Vec<ParticipantId> {
        self.typing.typing_participants().await
    }

    pub async fn active(&self) -> ActiveParticipants {
        self.active.lock().await.clone()
    }

    /// Replace the active set. Unknown ids leave the current set untouched.
    pub async fn set_active(
        &self,
        ids: impl IntoIterator<Item = ParticipantId>,
    ) -> Result<(), RegistryError> {
        let resolved = self.registry.resolve_active(ids)?;
        *self.active.lock().await = resolved;
        Ok(())
    }

    /// Add `id` at the end of the active set. `Ok(false)` if already active.
    pub async fn select(&self, id: ParticipantId) -> Result<bool, RegistryError> {
        if !self.registry.contains(&id) {
            return Err(RegistryError::UnknownParticipant(id));
        }
        Ok(self.active.lock().await.select(id))
    }

    /// Remove `id` from the active set. Returns `false` if it was not active.
    pub async fn deselect(&self, id: &ParticipantId) -> bool {
        self.active.lock().await.deselect(id)
    }

    /// Read-only view of every change made to this conversation.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events.subscribe()
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.registry.get(id)
    }

    pub async fn conversation_id(&self) -> ConversationId {
        self.user_context.lock().await.conversation_id.clone()
    }
}
