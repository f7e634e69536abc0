//! Shared utilities for Huddle.
//!
//! Logger bootstrap and clock helpers used by both the orchestration core
//! and the terminal client.

pub mod logger;
pub mod time;
