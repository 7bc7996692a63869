//! Upstream session configuration and persona enforcement.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::{PersonaConfig, ServerConfig};
use crate::core::realtime::messages::{RESPONSE_CREATE, SESSION_UPDATE};
use crate::core::realtime::{AudioFormat, ClientEvent, SessionConfig, TurnDetection};

/// Delay before the persona is re-sent after the initial configuration.
pub const REASSERT_DELAY: Duration = Duration::from_millis(1000);

/// Server VAD activation threshold.
pub const VAD_THRESHOLD: f32 = 0.5;
/// Audio kept before detected speech, in ms.
pub const VAD_PREFIX_PADDING_MS: u32 = 300;
/// Silence that ends a turn, in ms.
pub const VAD_SILENCE_DURATION_MS: u32 = 500;

/// Sample rate of the PCM audio the upstream produces.
pub const OUTPUT_SAMPLE_RATE: u32 = 24000;

/// Builds the upstream session configuration and keeps clients from
/// overriding server-authoritative fields.
#[derive(Debug, Clone)]
pub struct SessionNegotiator {
    model: String,
    voice_swap: bool,
    persona: Option<Arc<PersonaConfig>>,
}

impl SessionNegotiator {
    pub fn new(model: impl Into<String>, voice_swap: bool, persona: Option<Arc<PersonaConfig>>) -> Self {
        Self {
            model: model.into(),
            voice_swap,
            persona,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.realtime_model.clone(),
            config.voice_swap,
            config.persona.clone().map(Arc::new),
        )
    }

    /// The single `session.update` sent when the upstream opens.
    pub fn session_update(&self, sample_rate: u32) -> ClientEvent {
        let (modalities, output_audio_format) = if self.voice_swap {
            (vec!["text".to_string()], None)
        } else {
            (
                vec!["audio".to_string(), "text".to_string()],
                Some(AudioFormat::pcm(OUTPUT_SAMPLE_RATE)),
            )
        };

        ClientEvent::SessionUpdate {
            session: SessionConfig {
                model: Some(self.model.clone()),
                modalities: Some(modalities),
                instructions: self.persona.as_ref().map(|p| p.instructions.clone()),
                voice: self.persona.as_ref().and_then(|p| p.voice.clone()),
                input_audio_format: Some(AudioFormat::pcm(sample_rate)),
                output_audio_format,
                turn_detection: Some(TurnDetection::ServerVad {
                    threshold: VAD_THRESHOLD,
                    prefix_padding_ms: VAD_PREFIX_PADDING_MS,
                    silence_duration_ms: VAD_SILENCE_DURATION_MS,
                }),
            },
        }
    }

    /// Corrective `session.update` re-sent once after [`REASSERT_DELAY`].
    ///
    /// Only exists when a persona is configured.
    pub fn reassertion(&self) -> Option<ClientEvent> {
        let persona = self.persona.as_ref()?;
        Some(ClientEvent::SessionUpdate {
            session: SessionConfig {
                instructions: Some(persona.instructions.clone()),
                voice: persona.voice.clone(),
                ..Default::default()
            },
        })
    }

    /// Rewrite a client text frame before it goes upstream.
    ///
    /// With a persona, `session.update` loses `instructions`, `model` and
    /// (unless the persona allows it) `voice`, and `response.create` gets its
    /// `response.instructions` replaced by the per-turn text. Anything else,
    /// including non-JSON text, is returned unchanged.
    pub fn rewrite_client_frame(&self, text: String) -> String {
        let Some(persona) = self.persona.as_deref() else {
            return text;
        };
        let Ok(mut value) = serde_json::from_str::<Value>(&text) else {
            return text;
        };

        let changed = match value.get("type").and_then(Value::as_str) {
            Some(SESSION_UPDATE) => strip_locked_fields(&mut value, persona),
            Some(RESPONSE_CREATE) => force_turn_instructions(&mut value, persona),
            _ => false,
        };

        if !changed {
            return text;
        }
        match serde_json::to_string(&value) {
            Ok(rewritten) => {
                tracing::debug!("Rewrote client frame to keep persona fields");
                rewritten
            }
            Err(_) => text,
        }
    }
}

fn strip_locked_fields(frame: &mut Value, persona: &PersonaConfig) -> bool {
    let Some(session) = frame.get_mut("session").and_then(Value::as_object_mut) else {
        return false;
    };

    let mut removed = session.remove("instructions").is_some();
    removed |= session.remove("model").is_some();
    if !persona.allow_client_voice {
        removed |= session.remove("voice").is_some();
    }
    removed
}

fn force_turn_instructions(frame: &mut Value, persona: &PersonaConfig) -> bool {
    let Some(frame) = frame.as_object_mut() else {
        return false;
    };
    let turn = persona
        .turn_instructions
        .as_deref()
        .unwrap_or(&persona.instructions);

    let response = frame
        .entry("response")
        .or_insert_with(|| Value::Object(Default::default()));
    if !response.is_object() {
        *response = Value::Object(Default::default());
    }
    if let Some(response) = response.as_object_mut() {
        response.insert("instructions".to_string(), Value::String(turn.to_string()));
    }
    true
}
