//! Conversation pacing.
//!
//! All artificial delays of a send go through [`PacingPolicy`], so tests can
//! swap the randomized policy for a deterministic one.

use std::{sync::Mutex, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

/// Tunable delays, all in milliseconds.
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Offset added per position in the active set
    pub stagger_step_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each dispatch
    pub max_jitter_ms: u64,
    /// How long a typing indicator may live without a reply
    pub typing_timeout_ms: u64,
    pub typing_min_ms: u64,
    pub typing_max_ms: u64,
    pub typing_ms_per_char: u64,
    /// `sending -> sent`
    pub sent_delay_ms: u64,
    /// `sent -> delivered`
    pub delivered_delay_ms: u64,
    /// Reply appended -> user message `read`
    pub read_receipt_delay_ms: u64,
    /// User message `read` -> reply `read`
    pub reply_seen_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            stagger_step_ms: 1_200,
            max_jitter_ms: 800,
            typing_timeout_ms: 30_000,
            typing_min_ms: 1_000,
            typing_max_ms: 4_000,
            typing_ms_per_char: 20,
            sent_delay_ms: 300,
            delivered_delay_ms: 800,
            read_receipt_delay_ms: 600,
            reply_seen_delay_ms: 1_200,
        }
    }
}

impl PacingConfig {
    /// Deterministic part of the dispatch delay for position `index`.
    pub fn stagger(&self, index: usize) -> Duration {
        Duration::from_millis(self.stagger_step_ms.saturating_mul(index as u64))
    }

    /// How long a reply of `reply` would take to type, clamped to
    /// `[typing_min_ms, typing_max_ms]`.
    pub fn typing_duration(&self, reply: &str) -> Duration {
        let chars = reply.chars().count() as u64;
        let raw = chars.saturating_mul(self.typing_ms_per_char);
        let max = self.typing_max_ms.max(self.typing_min_ms);
        Duration::from_millis(raw.clamp(self.typing_min_ms, max))
    }
}

pub trait PacingPolicy: Send + Sync {
    /// Delay before participant `index` starts "typing".
    fn dispatch_delay(&self, index: usize) -> Duration;

    fn config(&self) -> &PacingConfig;

    fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.config().typing_timeout_ms)
    }

    fn typing_duration(&self, reply: &str) -> Duration {
        self.config().typing_duration(reply)
    }

    fn sent_delay(&self) -> Duration {
        Duration::from_millis(self.config().sent_delay_ms)
    }

    fn delivered_delay(&self) -> Duration {
        Duration::from_millis(self.config().delivered_delay_ms)
    }

    fn read_receipt_delay(&self) -> Duration {
        Duration::from_millis(self.config().read_receipt_delay_ms)
    }

    fn reply_seen_delay(&self) -> Duration {
        Duration::from_millis(self.config().reply_seen_delay_ms)
    }
}

/// Stagger plus bounded random jitter
pub struct RandomPacing {
    config: PacingConfig,
    rng: Mutex<StdRng>,
}

impl RandomPacing {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible jitter sequence.
    pub fn seeded(config: PacingConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl PacingPolicy for RandomPacing {
    fn dispatch_delay(&self, index: usize) -> Duration {
        let jitter = if self.config.max_jitter_ms == 0 {
            0
        } else {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.random_range(0..self.config.max_jitter_ms)
        };
        self.config.stagger(index) + Duration::from_millis(jitter)
    }

    fn config(&self) -> &PacingConfig {
        &self.config
    }
}

/// Stagger only, no jitter
#[derive(Debug, Clone, Default)]
pub struct FixedPacing {
    config: PacingConfig,
}

impl FixedPacing {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }
}

impl PacingPolicy for FixedPacing {
    fn dispatch_delay(&self, index: usize) -> Duration {
        self.config.stagger(index)
    }

    fn config(&self) -> &PacingConfig {
        &self.config
    }
}
