//! Configuration module for the voice bridge
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voice_bridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

mod env;
mod merge;
mod validation;
mod yaml;

pub use validation::SAMPLE_RATE_RANGE;
pub use yaml::YamlConfig;

/// Default realtime model requested from OpenAI.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";

/// Default ElevenLabs voice.
pub const DEFAULT_ELEVEN_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";

/// Default ElevenLabs model.
pub const DEFAULT_ELEVEN_MODEL_ID: &str = "eleven_multilingual_v2";

/// Default ElevenLabs output format for `/tts` when the caller passes none.
pub const DEFAULT_ELEVEN_OUTPUT_FORMAT: &str = crate::core::tts::MP3_44100_128;

/// Default Recall.ai regional API base.
pub const DEFAULT_RECALL_BASE_URL: &str = "https://us-west-2.recall.ai";

/// Default ElevenLabs API base.
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = crate::core::tts::ELEVENLABS_TTS_URL;

/// Default input sample rate when the client does not pass one.
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Default timeout for outbound HTTP calls.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value was present but could not be used
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// A required value is absent
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Which synthesis sink a session uses when the client does not pass a `media_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultRoute {
    /// Synthesize MP3 and inject it into a Recall.ai bot
    #[default]
    BotAudio,
    /// Synthesize PCM and push it to a raw-media URL (only usable with `media_url`)
    RawMedia,
    /// No synthesis sink
    Disabled,
}

impl DefaultRoute {
    /// Parse a route name, accepting the common spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bot_audio" | "bot-audio" | "recall" => Some(Self::BotAudio),
            "raw_media" | "raw-media" | "media" => Some(Self::RawMedia),
            "none" | "off" | "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for DefaultRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BotAudio => write!(f, "bot_audio"),
            Self::RawMedia => write!(f, "raw_media"),
            Self::Disabled => write!(f, "none"),
        }
    }
}

/// Server-authoritative persona applied to every upstream session.
///
/// When present, clients cannot override the instructions, model or
/// (unless `allow_client_voice`) the voice of their session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaConfig {
    /// System instructions sent in the session configuration
    pub instructions: String,
    /// Voice selector sent in the session configuration
    pub voice: Option<String>,
    /// Text forced into every client `response.create`
    pub turn_instructions: Option<String>,
    /// Let client `session.update` frames keep their `voice` field
    pub allow_client_voice: bool,
}

/// Server configuration
///
/// Contains all configuration needed to run the bridge, including:
/// - Server settings (host, port, TLS)
/// - Upstream realtime session settings and optional persona
/// - ElevenLabs TTS settings
/// - Recall.ai meeting-bot settings
/// - Delivery routing
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Upstream realtime session
    /// OpenAI API key, required to serve the bridge
    pub openai_api_key: Option<String>,
    pub realtime_model: String,
    /// Realtime WebSocket base URL (the model is appended as a query parameter)
    pub realtime_url: String,
    /// Ask upstream for text only and re-voice it through the TTS sinks
    pub voice_swap: bool,
    pub default_sample_rate: u32,
    pub persona: Option<PersonaConfig>,

    // ElevenLabs TTS
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: String,
    pub eleven_voice_id: String,
    pub eleven_model_id: String,
    /// Output format `/tts` uses when the request names none
    pub eleven_output_format: String,

    // Recall.ai
    pub recall_api_key: Option<String>,
    pub recall_base_url: String,
    /// Bot used when the client does not pass `bot_id`
    pub recall_bot_id: Option<String>,

    // Delivery
    pub default_route: DefaultRoute,
    pub broadcast_enabled: bool,
    pub http_timeout_seconds: u64,
    /// Accept loopback/private `media_url` targets (development only)
    pub allow_private_media_urls: bool,

    // Security
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
}

/// Zeroize all secret fields when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.elevenlabs_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.recall_api_key {
            key.zeroize();
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            tls: None,
            openai_api_key: None,
            realtime_model: DEFAULT_REALTIME_MODEL.to_string(),
            realtime_url: crate::core::realtime::OPENAI_REALTIME_URL.to_string(),
            voice_swap: true,
            default_sample_rate: DEFAULT_SAMPLE_RATE,
            persona: None,
            elevenlabs_api_key: None,
            elevenlabs_base_url: DEFAULT_ELEVENLABS_BASE_URL.to_string(),
            eleven_voice_id: DEFAULT_ELEVEN_VOICE_ID.to_string(),
            eleven_model_id: DEFAULT_ELEVEN_MODEL_ID.to_string(),
            eleven_output_format: DEFAULT_ELEVEN_OUTPUT_FORMAT.to_string(),
            recall_api_key: None,
            recall_base_url: DEFAULT_RECALL_BASE_URL.to_string(),
            recall_bot_id: None,
            default_route: DefaultRoute::default(),
            broadcast_enabled: true,
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
            allow_private_media_urls: false,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and defaults).
    ///
    /// The `.env` file is loaded in `main.rs` before this is called, so its
    /// values are visible here as ordinary environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string ("host:port")
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// The OpenAI key, or an error when the bridge cannot run without it.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))
    }

    /// The Recall.ai key, or an error when bot calls cannot be made.
    pub fn require_recall_api_key(&self) -> Result<&str, ConfigError> {
        self.recall_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("RECALL_API_KEY"))
    }

    /// Full upstream URL including the model query parameter.
    pub fn realtime_endpoint(&self) -> String {
        format!("{}?model={}", self.realtime_url, self.realtime_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    // Helper to clean up environment variables
    pub(super) fn cleanup_env_vars() {
        unsafe {
            for key in env::ENV_KEYS {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_default_route_parse() {
        assert_eq!(DefaultRoute::parse("bot_audio"), Some(DefaultRoute::BotAudio));
        assert_eq!(DefaultRoute::parse("Recall"), Some(DefaultRoute::BotAudio));
        assert_eq!(DefaultRoute::parse("raw-media"), Some(DefaultRoute::RawMedia));
        assert_eq!(DefaultRoute::parse(" none "), Some(DefaultRoute::Disabled));
        assert_eq!(DefaultRoute::parse("carrier-pigeon"), None);
    }

    #[test]
    fn test_default_route_display_round_trips() {
        for route in [
            DefaultRoute::BotAudio,
            DefaultRoute::RawMedia,
            DefaultRoute::Disabled,
        ] {
            assert_eq!(DefaultRoute::parse(&route.to_string()), Some(route));
        }
    }

    #[test]
    fn test_realtime_endpoint_appends_model() {
        let mut config = ServerConfig::default();
        config.realtime_url = "wss://example.test/v1/realtime".to_string();
        config.realtime_model = "gpt-4o-mini-realtime-preview".to_string();
        assert_eq!(
            config.realtime_endpoint(),
            "wss://example.test/v1/realtime?model=gpt-4o-mini-realtime-preview"
        );
    }

    #[test]
    fn test_require_openai_api_key() {
        let mut config = ServerConfig::default();
        assert!(matches!(
            config.require_openai_api_key(),
            Err(ConfigError::Missing("OPENAI_API_KEY"))
        ));

        config.openai_api_key = Some(String::new());
        assert!(config.require_openai_api_key().is_err());

        config.openai_api_key = Some("sk-test".to_string());
        assert_eq!(config.require_openai_api_key().unwrap(), "sk-test");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert_eq!(config.realtime_model, DEFAULT_REALTIME_MODEL);
        assert_eq!(config.default_sample_rate, 16000);
        assert_eq!(config.default_route, DefaultRoute::BotAudio);
        assert_eq!(config.eleven_output_format, "mp3_44100_128");
        assert!(config.voice_swap);
        assert!(config.broadcast_enabled);
        assert!(config.persona.is_none());
        assert!(!config.is_tls_enabled());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_values() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("PORT", "8081");
            std::env::set_var("OPENAI_API_KEY", "sk-env");
            std::env::set_var("DELIVERY_ROUTE", "none");
            std::env::set_var("PERSONA_INSTRUCTIONS", "You are Munffett.");
            std::env::set_var("PERSONA_VOICE", "verse");
            std::env::set_var("BROADCAST_ENABLED", "false");
            std::env::set_var("ELEVEN_OUTPUT_FORMAT", "mp3_22050_32");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.default_route, DefaultRoute::Disabled);
        assert!(!config.broadcast_enabled);
        assert_eq!(config.eleven_output_format, "mp3_22050_32");
        let persona = config.persona.as_ref().unwrap();
        assert_eq!(persona.instructions, "You are Munffett.");
        assert_eq!(persona.voice.as_deref(), Some("verse"));
        assert!(!persona.allow_client_voice);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("PORT", "not-a-port");
        }

        let result = ServerConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        ));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("PORT", "4000");
            std::env::set_var("RECALL_BOT_ID", "env-bot");
            std::env::set_var("ELEVEN_OUTPUT_FORMAT", "mp3_22050_32");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(
            &config_path,
            r#"
server:
  port: 5000
tts:
  output_format: "pcm_24000"
recall:
  bot_id: "yaml-bot"
delivery:
  route: "raw_media"
"#,
        )
        .unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.recall_bot_id.as_deref(), Some("yaml-bot"));
        assert_eq!(config.eleven_output_format, "pcm_24000");
        assert_eq!(config.default_route, DefaultRoute::RawMedia);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let result = ServerConfig::from_file(&PathBuf::from("/nonexistent/voice-bridge.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
