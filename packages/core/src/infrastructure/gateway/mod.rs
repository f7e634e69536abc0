//! Chat gateway implementations.

mod http;

pub use http::{GatewayConfig, HttpChatGateway};
