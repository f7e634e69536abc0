//! Terminal client for Huddle.
//!
//! Reads lines from the terminal, sends them to the active participants and
//! prints the conversation as it unfolds.

pub mod cli;
pub mod command;
pub mod error;
pub mod render;
pub mod repl;
pub mod transcript;

// Re-export entry points
pub use cli::Args;
pub use error::ClientError;
pub use repl::run;
