//! Per-connection parameters from the downstream query string.

use std::collections::HashMap;

use crate::config::SAMPLE_RATE_RANGE;

/// Parameters a client passes when opening the bridge.
///
/// `GET /?sample_rate=24000&media_url=https://...&bot_id=...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Input PCM sample rate
    pub sample_rate: u32,
    /// Raw-media playback URL; selects the raw-media sink
    pub media_url: Option<String>,
    /// Recall bot to inject audio into
    pub bot_id: Option<String>,
}

impl ConnectionParams {
    /// Read the parameters, falling back to `default_sample_rate` when the
    /// rate is absent, not an integer, or outside 8000..=48000 Hz.
    pub fn from_query(query: &HashMap<String, String>, default_sample_rate: u32) -> Self {
        let sample_rate = match query.get("sample_rate").map(|s| s.trim()) {
            None | Some("") => default_sample_rate,
            Some(raw) => match raw.parse::<u32>() {
                Ok(rate) if SAMPLE_RATE_RANGE.contains(&rate) => rate,
                _ => {
                    tracing::warn!(sample_rate = raw, "Ignoring invalid sample_rate");
                    default_sample_rate
                }
            },
        };

        let non_empty = |key: &str| {
            query
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            sample_rate,
            media_url: non_empty("media_url"),
            bot_id: non_empty("bot_id"),
        }
    }
}
