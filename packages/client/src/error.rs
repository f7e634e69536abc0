//! Client error types.

use std::path::PathBuf;

use huddle_core::{
    domain::{RegistryError, ValueObjectError},
    usecase::SendMessageError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read pacing config {path}: {source}")]
    PacingConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid participant id: {0}")]
    InvalidParticipant(#[from] ValueObjectError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("message not sent: {0}")]
    Send(#[from] SendMessageError),
}
