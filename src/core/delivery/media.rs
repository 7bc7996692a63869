//! Raw-media push: PCM audio POSTed to a caller-supplied player in chunks.

use base64::prelude::*;
use serde::Serialize;
use url::Url;

use super::DeliveryError;

/// Largest PCM chunk per request (one second of 16 kHz 16-bit mono).
pub const MAX_CHUNK_BYTES: usize = 32000;

/// Sample rate of the pushed PCM.
pub const PUSH_SAMPLE_RATE_HZ: u32 = 16000;

#[derive(Serialize)]
struct MediaChunk<'a> {
    audio: &'a str,
    encoding: &'static str,
    sample_rate_hz: u32,
}

/// Outcome of pushing one utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    pub sent: usize,
    pub failed: usize,
}

/// POSTs PCM chunks to raw-media URLs.
#[derive(Debug, Clone)]
pub struct MediaPushClient {
    http: reqwest::Client,
}

impl MediaPushClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Push `pcm` to `url` in chunks of at most [`MAX_CHUNK_BYTES`].
    ///
    /// A failing chunk is logged and skipped; later chunks are still sent.
    /// Only an utterance where every chunk failed is reported as an error.
    pub async fn push_pcm(&self, url: &Url, pcm: &[u8]) -> Result<PushReport, DeliveryError> {
        let mut report = PushReport::default();

        for (index, chunk) in pcm.chunks(MAX_CHUNK_BYTES).enumerate() {
            match self.post_chunk(url, chunk).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::warn!(chunk = index, error = %e, "Raw-media chunk failed, skipping");
                    report.failed += 1;
                }
            }
        }

        if report.sent == 0 && report.failed > 0 {
            return Err(DeliveryError::AllChunksFailed(report.failed));
        }
        tracing::info!(sent = report.sent, failed = report.failed, "Pushed raw media");
        Ok(report)
    }

    async fn post_chunk(&self, url: &Url, chunk: &[u8]) -> Result<(), DeliveryError> {
        let audio = BASE64_STANDARD.encode(chunk);
        let response = self
            .http
            .post(url.clone())
            .json(&MediaChunk {
                audio: &audio,
                encoding: "pcm16",
                sample_rate_hz: PUSH_SAMPLE_RATE_HZ,
            })
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                sink: "raw_media",
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
