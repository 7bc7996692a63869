//! Client-to-upstream relay.
//!
//! A [`BridgeSession`] pairs one downstream WebSocket with one upstream
//! realtime session. Client frames are rewritten by the
//! [`SessionNegotiator`] on the way up; upstream frames go back to the
//! client untouched while the [`EventInterceptor`] assembles finished
//! text responses for delivery.

pub mod accumulator;
pub mod frame;
pub mod interceptor;
pub mod negotiator;
pub mod params;
pub mod session;

use thiserror::Error;

use crate::core::realtime::{self, RealtimeError};

pub use accumulator::UtteranceBuffer;
pub use frame::{CloseReason, Frame, FrameSink, FrameSource, split_downstream, split_upstream};
pub use interceptor::EventInterceptor;
pub use negotiator::SessionNegotiator;
pub use params::ConnectionParams;
pub use session::{BridgeSession, ChannelHalves, SessionEnd, SessionState};

/// Errors that end a bridge session.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] RealtimeError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Open the upstream realtime session and split it into channel halves.
pub async fn open_upstream(endpoint: String, api_key: String) -> Result<ChannelHalves, BridgeError> {
    let socket = realtime::connect(&endpoint, &api_key).await?;
    Ok(split_upstream(socket))
}
