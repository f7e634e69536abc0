//! Domain layer for the conversation.
//!
//! This module contains the conversation model and its invariants,
//! independent of timers, transport and rendering concerns.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod gateway;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use entity::{Author, Message, MessageLog, MessageStatus, NewMessage, Participant};
pub use error::{ChatFailure, FailureKind, MessageLogError, RegistryError, ValueObjectError};
pub use event::{ConversationEvent, TypingStopReason};
pub use factory::ConversationIdFactory;
pub use gateway::{ChatGateway, ChatReply, ChatRequest, UserContext};
pub use registry::{ActiveParticipants, ParticipantRegistry};
pub use repository::MessageRepository;
pub use value_object::{ConversationId, Epoch, MessageBody, MessageId, ParticipantId, Timestamp};
