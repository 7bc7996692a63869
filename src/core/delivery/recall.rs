//! Recall.ai meeting-bot API.
//!
//! - `POST {base}/api/v1/bot/{bot_id}/output_audio/` injects MP3 audio into a bot
//! - `POST {base}/api/v1/bot/` provisions a bot for a meeting
//!
//! The configured key is sent verbatim as the `Authorization` header, so it
//! must already carry any scheme prefix Recall expects (e.g. `Token ...`).

use base64::prelude::*;
use serde::Serialize;
use serde_json::Value;

use super::DeliveryError;
use crate::config::ServerConfig;

/// Bot name used when provisioning without one.
pub const DEFAULT_BOT_NAME: &str = "Zoom Voice Agent";

#[derive(Serialize)]
struct OutputAudio<'a> {
    kind: &'static str,
    b64_data: &'a str,
}

/// Bot provisioning request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateBotRequest {
    pub meeting_url: String,
    pub bot_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_media: Option<OutputMedia>,
    pub variant: Variant,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputMedia {
    pub camera: CameraOutput,
}

/// Camera output rendered from a web page.
#[derive(Debug, Clone, Serialize)]
pub struct CameraOutput {
    pub kind: &'static str,
    pub config: CameraConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraConfig {
    pub url: String,
}

/// Platform-specific bot variant.
#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub zoom: &'static str,
}

impl CreateBotRequest {
    /// A Zoom web bot, optionally streaming `page_url` as its camera.
    pub fn new(meeting_url: String, bot_name: Option<String>, page_url: Option<String>) -> Self {
        Self {
            meeting_url,
            bot_name: bot_name.unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            output_media: page_url.map(|url| OutputMedia {
                camera: CameraOutput {
                    kind: "webpage",
                    config: CameraConfig { url },
                },
            }),
            variant: Variant { zoom: "web_4_core" },
        }
    }
}

/// Recall.ai REST client.
#[derive(Clone)]
pub struct RecallClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for RecallClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecallClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RecallClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build a client from server configuration, if a key is configured.
    pub fn from_config(config: &ServerConfig, http: reqwest::Client) -> Result<Self, DeliveryError> {
        let api_key = config
            .require_recall_api_key()
            .map_err(|_| DeliveryError::MissingCredential("RECALL_API_KEY"))?;
        Ok(Self::new(http, config.recall_base_url.clone(), api_key))
    }

    fn output_audio_url(&self, bot_id: &str) -> String {
        format!("{}/api/v1/bot/{}/output_audio/", self.base_url, bot_id)
    }

    /// Play MP3 audio through a bot.
    pub async fn output_audio(&self, bot_id: &str, mp3: &[u8]) -> Result<(), DeliveryError> {
        let b64_data = BASE64_STANDARD.encode(mp3);
        let response = self
            .http
            .post(self.output_audio_url(bot_id))
            .header("Authorization", &self.api_key)
            .json(&OutputAudio {
                kind: "mp3",
                b64_data: &b64_data,
            })
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                sink: "bot_audio",
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(bot_id, bytes = mp3.len(), status = status.as_u16(), "Injected bot audio");
        Ok(())
    }

    /// Provision a bot and return Recall's JSON description of it.
    pub async fn create_bot(&self, request: &CreateBotRequest) -> Result<Value, DeliveryError> {
        let response = self
            .http
            .post(format!("{}/api/v1/bot/", self.base_url))
            .header("Authorization", &self.api_key)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                sink: "create_bot",
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DeliveryError::Network(format!("Failed to parse response: {}", e)))
    }
}
