//! Delivery of completed utterances.
//!
//! Sinks:
//! - Local broadcast to `/listen` subscribers (always, when enabled)
//! - Bot audio injection through Recall.ai (MP3)
//! - Raw-media push to a caller-supplied URL (chunked PCM)
//!
//! At most one of the two synthesis sinks runs per session.

pub mod broadcast;
pub mod dispatcher;
pub mod media;
pub mod recall;

use thiserror::Error;

use crate::core::tts::TTSError;

pub use broadcast::ListenerRegistry;
pub use dispatcher::{DeliveryDispatcher, DeliveryRoute};
pub use media::{MAX_CHUNK_BYTES, MediaPushClient, PushReport};
pub use recall::{CreateBotRequest, RecallClient};

/// Errors raised by a single delivery sink.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Bot audio was requested but no bot id is known
    #[error("No bot id: pass bot_id on the connection or set RECALL_BOT_ID")]
    MissingBotId,

    /// A credential the sink needs is not configured
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    /// Synthesis failed
    #[error("TTS failed: {0}")]
    Tts(#[from] TTSError),

    /// The request could not be sent
    #[error("Network error: {0}")]
    Network(String),

    /// The sink answered with a non-success status
    #[error("{sink} returned {status}: {body}")]
    Status {
        sink: &'static str,
        status: u16,
        body: String,
    },

    /// Every raw-media chunk of an utterance failed
    #[error("All {0} raw-media chunks failed")]
    AllChunksFailed(usize),
}
