//! ElevenLabs TTS provider.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://api.elevenlabs.io/v1/text-to-speech/{voice_id}/stream`
//! - Auth: `xi-api-key` header
//! - Output: selected by `output_format` (e.g. `mp3_44100_128`, `pcm_16000`)

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use super::{SpeechSynthesizer, TTSError, TTSResult};
use crate::config::ServerConfig;

/// ElevenLabs API base URL
pub const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io";

const XI_API_KEY_HEADER: &str = "xi-api-key";

/// Voice tuning sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub use_speaker_boost: bool,
    pub speed: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.15,
            similarity_boost: 0.9,
            use_speaker_boost: true,
            speed: 1.0,
        }
    }
}

/// One synthesis request. Unset voice/model fall back to the client defaults.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    pub output_format: String,
    pub voice_settings: VoiceSettings,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, output_format: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: None,
            model_id: None,
            output_format: output_format.into(),
            voice_settings: VoiceSettings::default(),
        }
    }
}

#[derive(Serialize)]
struct RequestBody<'a> {
    text: &'a str,
    model_id: &'a str,
    output_format: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs streaming TTS client.
#[derive(Clone)]
pub struct ElevenLabsTTS {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    voice_id: String,
    model_id: String,
}

impl std::fmt::Debug for ElevenLabsTTS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsTTS")
            .field("base_url", &self.base_url)
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

impl ElevenLabsTTS {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        voice_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> TTSResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(TTSError::MissingApiKey);
        }
        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            voice_id: voice_id.into(),
            model_id: model_id.into(),
        })
    }

    /// Build a client from server configuration.
    pub fn from_config(config: &ServerConfig, http: reqwest::Client) -> TTSResult<Self> {
        let api_key = config
            .elevenlabs_api_key
            .clone()
            .ok_or(TTSError::MissingApiKey)?;
        Self::new(
            http,
            api_key,
            config.elevenlabs_base_url.clone(),
            config.eleven_voice_id.clone(),
            config.eleven_model_id.clone(),
        )
    }

    /// The same client sending through another HTTP client.
    pub fn with_http(&self, http: reqwest::Client) -> Self {
        Self {
            http,
            ..self.clone()
        }
    }

    pub fn default_voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn default_model_id(&self) -> &str {
        &self.model_id
    }

    fn stream_url(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{}/stream", self.base_url, voice_id)
    }

    /// Start a streaming synthesis and return the successful response.
    ///
    /// The body has not been read yet; callers either forward it as a
    /// stream or collect it.
    pub async fn stream(&self, request: &SpeechRequest) -> TTSResult<reqwest::Response> {
        if request.text.trim().is_empty() {
            return Err(TTSError::InvalidRequest("text is empty".to_string()));
        }

        let voice_id = request.voice_id.as_deref().unwrap_or(&self.voice_id);
        let model_id = request.model_id.as_deref().unwrap_or(&self.model_id);
        let body = RequestBody {
            text: request.text.trim(),
            model_id,
            output_format: &request.output_format,
            voice_settings: request.voice_settings,
        };

        let response = self
            .http
            .post(self.stream_url(voice_id))
            .query(&[("output_format", request.output_format.as_str())])
            .header(XI_API_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TTSError::ProviderError(format!(
                "ElevenLabs API error {}: {}",
                status, error_text
            )));
        }

        tracing::debug!(
            voice_id,
            model_id,
            output_format = %request.output_format,
            "ElevenLabs stream started"
        );
        Ok(response)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsTTS {
    async fn synthesize(&self, text: &str, output_format: &str) -> TTSResult<Bytes> {
        let response = self.stream(&SpeechRequest::new(text, output_format)).await?;
        response
            .bytes()
            .await
            .map_err(|e| TTSError::NetworkError(format!("Failed to read audio: {}", e)))
    }
}
