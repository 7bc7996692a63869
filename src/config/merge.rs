//! Layering YAML values over the environment configuration.

use std::path::PathBuf;

use super::env;
use super::yaml::{PersonaYaml, YamlConfig};
use super::{ConfigError, PersonaConfig, ServerConfig, TlsConfig};

/// Merge an optional YAML configuration over the environment.
///
/// Values present in YAML win; anything YAML leaves unset keeps its
/// environment (or default) value.
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let mut config = env::load()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            match (tls.cert_path, tls.key_path) {
                (Some(cert), Some(key)) => {
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::from(cert),
                        key_path: PathBuf::from(key),
                    });
                }
                (None, None) => {}
                (Some(_), None) => return Err(ConfigError::Missing("server.tls.key_path")),
                (None, Some(_)) => return Err(ConfigError::Missing("server.tls.cert_path")),
            }
        }
    }

    if let Some(realtime) = yaml.realtime {
        if realtime.api_key.is_some() {
            config.openai_api_key = realtime.api_key;
        }
        if let Some(model) = realtime.model {
            config.realtime_model = model;
        }
        if let Some(url) = realtime.url {
            config.realtime_url = url;
        }
        if let Some(swap) = realtime.voice_swap {
            config.voice_swap = swap;
        }
        if let Some(rate) = realtime.default_sample_rate {
            config.default_sample_rate = rate;
        }
    }

    if let Some(persona) = yaml.persona {
        config.persona = merge_persona(config.persona.take(), persona);
    }

    if let Some(tts) = yaml.tts {
        if tts.api_key.is_some() {
            config.elevenlabs_api_key = tts.api_key;
        }
        if let Some(base) = tts.base_url {
            config.elevenlabs_base_url = base;
        }
        if let Some(voice) = tts.voice_id {
            config.eleven_voice_id = voice;
        }
        if let Some(model) = tts.model_id {
            config.eleven_model_id = model;
        }
        if let Some(format) = tts.output_format {
            config.eleven_output_format = format;
        }
    }

    if let Some(recall) = yaml.recall {
        if recall.api_key.is_some() {
            config.recall_api_key = recall.api_key;
        }
        if let Some(base) = recall.base_url {
            config.recall_base_url = base;
        }
        if recall.bot_id.is_some() {
            config.recall_bot_id = recall.bot_id;
        }
    }

    if let Some(delivery) = yaml.delivery {
        if let Some(route) = delivery.route {
            config.default_route = env::parse_route("delivery.route", &route)?;
        }
        if let Some(enabled) = delivery.broadcast_enabled {
            config.broadcast_enabled = enabled;
        }
        if let Some(timeout) = delivery.http_timeout_seconds {
            config.http_timeout_seconds = timeout;
        }
        if let Some(allow) = delivery.allow_private_media_urls {
            config.allow_private_media_urls = allow;
        }
    }

    if let Some(security) = yaml.security
        && security.cors_allowed_origins.is_some()
    {
        config.cors_allowed_origins = security.cors_allowed_origins;
    }

    Ok(config)
}

/// A persona exists only when some layer provides instructions.
fn merge_persona(existing: Option<PersonaConfig>, yaml: PersonaYaml) -> Option<PersonaConfig> {
    let mut persona = match (yaml.instructions, existing) {
        (Some(instructions), Some(existing)) => PersonaConfig {
            instructions,
            ..existing
        },
        (Some(instructions), None) => PersonaConfig {
            instructions,
            voice: None,
            turn_instructions: None,
            allow_client_voice: false,
        },
        (None, Some(existing)) => existing,
        (None, None) => return None,
    };

    if yaml.voice.is_some() {
        persona.voice = yaml.voice;
    }
    if yaml.turn_instructions.is_some() {
        persona.turn_instructions = yaml.turn_instructions;
    }
    if let Some(allow) = yaml.allow_client_voice {
        persona.allow_client_voice = allow;
    }

    Some(persona)
}
