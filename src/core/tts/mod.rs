//! Text-to-speech.
//!
//! ElevenLabs is the only provider. The bridge uses it through the
//! [`SpeechSynthesizer`] trait so delivery sinks can be tested against a
//! stand-in; the `/tts` helper route streams straight from
//! [`ElevenLabsTTS::stream`].

mod elevenlabs;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use elevenlabs::{ELEVENLABS_TTS_URL, ElevenLabsTTS, SpeechRequest, VoiceSettings};

/// Compressed format requested for meeting-bot injection.
pub const MP3_44100_128: &str = "mp3_44100_128";

/// Uncompressed 16 kHz mono PCM requested for raw-media push.
pub const PCM_16000: &str = "pcm_16000";

/// Errors that can occur during speech synthesis.
#[derive(Debug, Error)]
pub enum TTSError {
    /// No API key is configured for the provider
    #[error("TTS API key is not configured")]
    MissingApiKey,

    /// The request could not be sent or the body could not be read
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The provider answered with a non-success status
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The request was rejected before sending
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type TTSResult<T> = Result<T, TTSError>;

/// Turns text into encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in the provider's `output_format` and return the
    /// whole payload.
    async fn synthesize(&self, text: &str, output_format: &str) -> TTSResult<Bytes>;
}

/// HTTP content type for an ElevenLabs output format string.
pub fn content_type_for(output_format: &str) -> &'static str {
    let format = output_format.to_lowercase();
    if format.starts_with("mp3") {
        "audio/mpeg"
    } else if format.starts_with("pcm") {
        "audio/L16"
    } else if format.starts_with("wav") {
        "audio/wav"
    } else {
        "application/octet-stream"
    }
}
