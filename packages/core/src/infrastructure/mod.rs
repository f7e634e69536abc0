//! Infrastructure layer.
//!
//! Concrete implementations behind the domain traits: the in-memory message
//! store, tokio-timer based typing indicators and the HTTP chat gateway.

pub mod dto;
pub mod gateway;
pub mod repository;
pub mod typing;

pub use gateway::{GatewayConfig, HttpChatGateway};
pub use repository::InMemoryMessageRepository;
pub use typing::TypingTracker;
