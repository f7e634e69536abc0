//! Command-line arguments.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use huddle_core::{PacingConfig, domain::ParticipantId};

use crate::error::ClientError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/chat";

/// Chat with a team of simulated colleagues from the terminal
#[derive(Debug, Clone, Parser)]
#[command(name = "huddle", version, about)]
pub struct Args {
    /// Chat API endpoint every participant request is POSTed to
    #[arg(long, env = "HUDDLE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Participants addressed by each message, in reply order
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_value = "sarah,alex"
    )]
    pub participants: Vec<String>,

    /// Your name, forwarded to the participants
    #[arg(long, env = "HUDDLE_USER")]
    pub user_name: Option<String>,

    /// Your role, forwarded to the participants
    #[arg(long)]
    pub user_role: Option<String>,

    /// JSON file overriding the pacing delays
    #[arg(long, value_name = "FILE")]
    pub pacing: Option<PathBuf>,

    /// Write the conversation as JSON to this file on exit
    #[arg(long, value_name = "FILE")]
    pub transcript: Option<PathBuf>,

    /// Send one message, wait for every reply, print and exit
    #[arg(long, value_name = "TEXT")]
    pub send: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    pub fn participant_ids(&self) -> Result<Vec<ParticipantId>, ClientError> {
        self.participants
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(|id| ParticipantId::try_from(id).map_err(ClientError::from))
            .collect()
    }

    /// Pacing from `--pacing`, or the defaults.
    pub fn pacing_config(&self) -> Result<PacingConfig, ClientError> {
        let Some(path) = &self.pacing else {
            return Ok(PacingConfig::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ClientError::PacingConfig {
            path: path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
