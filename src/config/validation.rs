//! Configuration validation logic.

use super::{ConfigError, ServerConfig};

/// Sample rates the upstream accepts for PCM input.
pub const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 8000..=48000;

/// Validate a merged configuration.
///
/// Credentials are not checked here: the OpenAI key is enforced when the
/// server starts, and the TTS/Recall keys only disable their sinks.
pub(super) fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    validate_sample_rate(config.default_sample_rate)?;
    validate_http_timeout(config.http_timeout_seconds)?;
    validate_url("OPENAI_REALTIME_URL", &config.realtime_url, &["ws", "wss"])?;
    validate_url(
        "ELEVENLABS_BASE_URL",
        &config.elevenlabs_base_url,
        &["http", "https"],
    )?;
    validate_url("RECALL_BASE_URL", &config.recall_base_url, &["http", "https"])?;
    Ok(())
}

fn validate_sample_rate(rate: u32) -> Result<(), ConfigError> {
    if SAMPLE_RATE_RANGE.contains(&rate) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: "DEFAULT_SAMPLE_RATE",
            value: rate.to_string(),
            reason: format!(
                "must be between {} and {}",
                SAMPLE_RATE_RANGE.start(),
                SAMPLE_RATE_RANGE.end()
            ),
        })
    }
}

fn validate_http_timeout(seconds: u64) -> Result<(), ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::InvalidValue {
            key: "HTTP_TIMEOUT_SECONDS",
            value: seconds.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn validate_url(key: &'static str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    if !schemes.contains(&parsed.scheme()) {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: format!("scheme must be one of {}", schemes.join(", ")),
        });
    }
    Ok(())
}
