use serde::Deserialize;
use std::path::PathBuf;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// take precedence over environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///   tls:
///     cert_path: "/etc/voice-bridge/cert.pem"
///     key_path: "/etc/voice-bridge/key.pem"
///
/// realtime:
///   api_key: "sk-..."
///   model: "gpt-4o-realtime-preview-2024-12-17"
///   voice_swap: true
///   default_sample_rate: 16000
///
/// persona:
///   instructions: "You are a cheerful meeting assistant."
///   voice: "verse"
///   turn_instructions: "Stay in character."
///   allow_client_voice: false
///
/// tts:
///   api_key: "el-..."
///   voice_id: "JBFqnCBsd6RMkjVDRZzb"
///   model_id: "eleven_multilingual_v2"
///   output_format: "mp3_44100_128"
///
/// recall:
///   api_key: "Token ..."
///   base_url: "https://us-west-2.recall.ai"
///   bot_id: "b0t-1d"
///
/// delivery:
///   route: "bot_audio"
///   broadcast_enabled: true
///   http_timeout_seconds: 30
///   allow_private_media_urls: false
///
/// security:
///   cors_allowed_origins: "*"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub realtime: Option<RealtimeYaml>,
    pub persona: Option<PersonaYaml>,
    pub tts: Option<TtsYaml>,
    pub recall: Option<RecallYaml>,
    pub delivery: Option<DeliveryYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Upstream realtime session settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RealtimeYaml {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub url: Option<String>,
    pub voice_swap: Option<bool>,
    pub default_sample_rate: Option<u32>,
}

/// Persona lock from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PersonaYaml {
    pub instructions: Option<String>,
    pub voice: Option<String>,
    pub turn_instructions: Option<String>,
    pub allow_client_voice: Option<bool>,
}

/// ElevenLabs settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsYaml {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    /// Default `/tts` output format
    pub output_format: Option<String>,
}

/// Recall.ai settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RecallYaml {
    /// Sent verbatim as the `Authorization` header
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub bot_id: Option<String>,
}

/// Delivery routing from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DeliveryYaml {
    pub route: Option<String>,
    pub broadcast_enabled: Option<bool>,
    pub http_timeout_seconds: Option<u64>,
    pub allow_private_media_urls: Option<bool>,
}

/// Security settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        let config: YamlConfig = serde_yaml::from_str(&contents)?;

        Ok(config)
    }
}
