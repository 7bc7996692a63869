//! Text-to-speech streaming helper
//!
//! `GET /tts?text=...` and `POST /tts` stream ElevenLabs audio straight
//! back to the caller without buffering the whole payload.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::core::tts::{SpeechRequest, TTSError, content_type_for};
use crate::state::AppState;

/// Request parameters, from the query string or a JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct TtsParams {
    #[serde(default)]
    pub text: String,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    pub output_format: Option<String>,
    pub speed: Option<f32>,
    pub stability: Option<f32>,
    pub similarity_boost: Option<f32>,
    pub use_speaker_boost: Option<bool>,
}

impl TtsParams {
    fn into_request(self, default_format: &str) -> SpeechRequest {
        let format = self
            .output_format
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| default_format.to_string());

        let mut request = SpeechRequest::new(self.text.trim(), format);
        request.voice_id = self.voice_id.filter(|v| !v.trim().is_empty());
        request.model_id = self.model_id.filter(|m| !m.trim().is_empty());

        let settings = &mut request.voice_settings;
        if let Some(speed) = self.speed {
            settings.speed = speed;
        }
        if let Some(stability) = self.stability {
            settings.stability = stability;
        }
        if let Some(boost) = self.similarity_boost {
            settings.similarity_boost = boost;
        }
        if let Some(speaker_boost) = self.use_speaker_boost {
            settings.use_speaker_boost = speaker_boost;
        }
        request
    }
}

pub async fn tts_get(State(state): State<Arc<AppState>>, Query(params): Query<TtsParams>) -> Response {
    stream_speech(&state, params).await
}

pub async fn tts_post(State(state): State<Arc<AppState>>, Json(params): Json<TtsParams>) -> Response {
    stream_speech(&state, params).await
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn stream_speech(state: &AppState, params: TtsParams) -> Response {
    if params.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "text is required");
    }

    let Some(tts) = state.tts_stream.as_ref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "ELEVENLABS_API_KEY is not configured",
        );
    };

    let request = params.into_request(&state.config.eleven_output_format);
    let voice_id = request
        .voice_id
        .clone()
        .unwrap_or_else(|| tts.default_voice_id().to_string());
    let model_id = request
        .model_id
        .clone()
        .unwrap_or_else(|| tts.default_model_id().to_string());

    let upstream = match tts.stream(&request).await {
        Ok(response) => response,
        Err(TTSError::InvalidRequest(msg)) => return error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => {
            error!(error = %e, "TTS request failed");
            return error_response(StatusCode::BAD_GATEWAY, e.to_string());
        }
    };

    info!(
        voice_id = %voice_id,
        model_id = %model_id,
        output_format = %request.output_format,
        "Streaming TTS audio"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&request.output_format))
        .header(header::CACHE_CONTROL, "no-store")
        .header("X-Voice-Id", voice_id)
        .header("X-Model-Id", model_id)
        .header("X-Format", request.output_format.as_str())
        .body(Body::from_stream(upstream.bytes_stream()))
        .unwrap_or_else(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
