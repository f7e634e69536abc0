//! Multi-participant conversation orchestration.
//!
//! A user types one message, and a team of simulated colleagues answers it:
//! each one "types" for a while and then replies independently. This crate
//! owns the message store, typing indicators, per-participant response
//! dispatch and the transcript follow logic. Rendering and input live in the
//! client.

pub mod domain;
pub mod infrastructure;
pub mod session;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use session::ConversationSession;
pub use usecase::{Dispatch, FixedPacing, PacingConfig, PacingPolicy, RandomPacing};
