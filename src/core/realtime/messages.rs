//! OpenAI Realtime API message types used by the bridge.
//!
//! The bridge relays frames verbatim, so only the handful of events it
//! builds or inspects are modelled here:
//!
//! Client events (sent upstream by the bridge itself):
//! - session.update - Session configuration sent when upstream opens
//!
//! Server events (inspected on the way downstream):
//! - response.text.delta - Text chunk
//! - response.text.done - Text complete
//! - response.done - Response complete
//!
//! Every other server event deserializes to [`ServerEvent::Other`].

use serde::{Deserialize, Serialize};

/// Event type of a session configuration frame.
pub const SESSION_UPDATE: &str = "session.update";

/// Event type of a response request frame.
pub const RESPONSE_CREATE: &str = "response.create";

// =============================================================================
// Session Configuration
// =============================================================================

/// Audio format descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// MIME-like format type, e.g. "audio/pcm"
    #[serde(rename = "type")]
    pub format_type: String,
    /// Sample rate in Hz
    pub rate: u32,
}

impl AudioFormat {
    /// 16-bit PCM at the given rate.
    pub fn pcm(rate: u32) -> Self {
        Self {
            format_type: "audio/pcm".to_string(),
            rate,
        }
    }
}

/// Turn detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        /// Activation threshold
        threshold: f32,
        /// Audio prefix padding in ms
        prefix_padding_ms: u32,
        /// Silence duration in ms
        silence_duration_ms: u32,
    },
}

/// Session configuration for the OpenAI Realtime API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Response modalities (text, audio)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    /// System instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Input audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,

    /// Output audio format, absent when the upstream should answer in text only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,

    /// Turn detection configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events the bridge originates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },
}

impl ClientEvent {
    /// Serialize to the JSON text carried by a WebSocket frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Reference to a response object inside `response.done`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseRef {
    /// Response ID
    #[serde(default)]
    pub id: Option<String>,
}

/// Server events the bridge inspects.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Text delta
    #[serde(rename = "response.text.delta")]
    TextDelta {
        /// Response ID
        #[serde(default)]
        response_id: Option<String>,
        /// Text delta
        #[serde(default)]
        delta: String,
    },

    /// Text done
    #[serde(rename = "response.text.done")]
    TextDone {
        /// Response ID
        #[serde(default)]
        response_id: Option<String>,
    },

    /// Response complete
    #[serde(rename = "response.done")]
    ResponseDone {
        /// Response ID, when sent at the top level
        #[serde(default)]
        response_id: Option<String>,
        /// Response object
        #[serde(default)]
        response: Option<ResponseRef>,
    },

    /// Any event the bridge only relays
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_update_serialization() {
        let event = ClientEvent::SessionUpdate {
            session: SessionConfig {
                model: Some("gpt-4o-realtime-preview".to_string()),
                modalities: Some(vec!["text".to_string()]),
                input_audio_format: Some(AudioFormat::pcm(16000)),
                turn_detection: Some(TurnDetection::ServerVad {
                    threshold: 0.5,
                    prefix_padding_ms: 300,
                    silence_duration_ms: 500,
                }),
                ..Default::default()
            },
        };

        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["input_audio_format"]["type"], "audio/pcm");
        assert_eq!(value["session"]["input_audio_format"]["rate"], 16000);
        assert_eq!(value["session"]["turn_detection"]["type"], "server_vad");
        assert_eq!(value["session"]["turn_detection"]["prefix_padding_ms"], 300);
        assert!(value["session"].get("output_audio_format").is_none());
        assert!(value["session"].get("instructions").is_none());
    }

    #[test]
    fn test_text_delta_deserialization() {
        let event: ServerEvent = serde_json::from_value(json!({
            "type": "response.text.delta",
            "response_id": "resp_1",
            "item_id": "item_1",
            "output_index": 0,
            "content_index": 0,
            "delta": "Hel"
        }))
        .unwrap();

        match event {
            ServerEvent::TextDelta { response_id, delta } => {
                assert_eq!(response_id.as_deref(), Some("resp_1"));
                assert_eq!(delta, "Hel");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_response_done_nested_id() {
        let event: ServerEvent = serde_json::from_value(json!({
            "type": "response.done",
            "response": { "id": "resp_9", "status": "completed", "output": [] }
        }))
        .unwrap();

        match event {
            ServerEvent::ResponseDone {
                response_id,
                response,
            } => {
                assert!(response_id.is_none());
                assert_eq!(response.unwrap().id.as_deref(), Some("resp_9"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_is_other() {
        let event: ServerEvent = serde_json::from_value(json!({
            "type": "response.audio.delta",
            "delta": "AAAA"
        }))
        .unwrap();
        assert!(matches!(event, ServerEvent::Other));
    }
}
