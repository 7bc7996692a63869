//! Environment variable loading.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, DefaultRoute, PersonaConfig, ServerConfig, TlsConfig};

/// Every variable this module reads.
pub(super) const ENV_KEYS: &[&str] = &[
    "HOST",
    "PORT",
    "TLS_CERT_PATH",
    "TLS_KEY_PATH",
    "OPENAI_API_KEY",
    "OPENAI_REALTIME_MODEL",
    "OPENAI_REALTIME_URL",
    "VOICE_SWAP",
    "DEFAULT_SAMPLE_RATE",
    "PERSONA_INSTRUCTIONS",
    "PERSONA_VOICE",
    "PERSONA_TURN_INSTRUCTIONS",
    "PERSONA_ALLOW_CLIENT_VOICE",
    "ELEVENLABS_API_KEY",
    "ELEVENLABS_BASE_URL",
    "ELEVEN_VOICE_ID",
    "ELEVEN_MODEL_ID",
    "ELEVEN_OUTPUT_FORMAT",
    "RECALL_API_KEY",
    "RECALL_BASE_URL",
    "RECALL_BOT_ID",
    "DELIVERY_ROUTE",
    "BROADCAST_ENABLED",
    "HTTP_TIMEOUT_SECONDS",
    "ALLOW_PRIVATE_MEDIA_URLS",
    "CORS_ALLOWED_ORIGINS",
];

/// Non-empty value of an environment variable.
pub(super) fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(super) fn parse<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

pub(super) fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn bool_var(key: &'static str) -> Result<Option<bool>, ConfigError> {
    var(key).map(|v| parse_bool(key, &v)).transpose()
}

pub(super) fn parse_route(key: &'static str, value: &str) -> Result<DefaultRoute, ConfigError> {
    DefaultRoute::parse(value).ok_or_else(|| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: "expected bot_audio, raw_media or none".to_string(),
    })
}

/// Build a configuration from defaults overlaid with environment variables.
pub(super) fn load() -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::default();

    if let Some(host) = var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse::<u16>("PORT")? {
        config.port = port;
    }

    config.tls = match (var("TLS_CERT_PATH"), var("TLS_KEY_PATH")) {
        (Some(cert), Some(key)) => Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        }),
        (None, None) => None,
        (Some(_), None) => return Err(ConfigError::Missing("TLS_KEY_PATH")),
        (None, Some(_)) => return Err(ConfigError::Missing("TLS_CERT_PATH")),
    };

    config.openai_api_key = var("OPENAI_API_KEY");
    if let Some(model) = var("OPENAI_REALTIME_MODEL") {
        config.realtime_model = model;
    }
    if let Some(url) = var("OPENAI_REALTIME_URL") {
        config.realtime_url = url;
    }
    if let Some(swap) = bool_var("VOICE_SWAP")? {
        config.voice_swap = swap;
    }
    if let Some(rate) = parse::<u32>("DEFAULT_SAMPLE_RATE")? {
        config.default_sample_rate = rate;
    }

    config.persona = match var("PERSONA_INSTRUCTIONS") {
        Some(instructions) => Some(PersonaConfig {
            instructions,
            voice: var("PERSONA_VOICE"),
            turn_instructions: var("PERSONA_TURN_INSTRUCTIONS"),
            allow_client_voice: bool_var("PERSONA_ALLOW_CLIENT_VOICE")?.unwrap_or(false),
        }),
        None => None,
    };

    config.elevenlabs_api_key = var("ELEVENLABS_API_KEY");
    if let Some(base) = var("ELEVENLABS_BASE_URL") {
        config.elevenlabs_base_url = base;
    }
    if let Some(voice) = var("ELEVEN_VOICE_ID") {
        config.eleven_voice_id = voice;
    }
    if let Some(model) = var("ELEVEN_MODEL_ID") {
        config.eleven_model_id = model;
    }
    if let Some(format) = var("ELEVEN_OUTPUT_FORMAT") {
        config.eleven_output_format = format;
    }

    config.recall_api_key = var("RECALL_API_KEY");
    if let Some(base) = var("RECALL_BASE_URL") {
        config.recall_base_url = base;
    }
    config.recall_bot_id = var("RECALL_BOT_ID");

    if let Some(route) = var("DELIVERY_ROUTE") {
        config.default_route = parse_route("DELIVERY_ROUTE", &route)?;
    }
    if let Some(enabled) = bool_var("BROADCAST_ENABLED")? {
        config.broadcast_enabled = enabled;
    }
    if let Some(timeout) = parse::<u64>("HTTP_TIMEOUT_SECONDS")? {
        config.http_timeout_seconds = timeout;
    }
    if let Some(allow) = bool_var("ALLOW_PRIVATE_MEDIA_URLS")? {
        config.allow_private_media_urls = allow;
    }

    config.cors_allowed_origins = var("CORS_ALLOWED_ORIGINS");

    Ok(config)
}
