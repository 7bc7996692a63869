//! Upstream conversational session (OpenAI Realtime API).
//!
//! The bridge treats the upstream as an opaque JSON-framed WebSocket. This
//! module owns the handshake and the few message shapes the bridge builds or
//! inspects; everything else is relayed untouched.

mod client;
pub mod messages;

use thiserror::Error;

pub use client::{UpstreamSocket, connect};
pub use messages::{AudioFormat, ClientEvent, ServerEvent, SessionConfig, TurnDetection};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Errors that can occur while opening the upstream session.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
