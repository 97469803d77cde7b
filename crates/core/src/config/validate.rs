use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upstream base URL is an http(s) URL
/// - Timeouts and concurrency limits are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let base_url = config.upstream.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "upstream.base_url must be an http(s) URL, got '{}'",
            config.upstream.base_url
        )));
    }

    if config.upstream.fetch_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.fetch_timeout_secs cannot be 0".to_string(),
        ));
    }

    let engine = &config.engine;
    for (name, value) in [
        ("engine.probe_timeout_secs", engine.probe_timeout_secs),
        ("engine.encode_timeout_secs", engine.encode_timeout_secs),
        ("engine.long_timeout_secs", engine.long_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    if engine.max_concurrent_invocations == 0 {
        return Err(ConfigError::ValidationError(
            "engine.max_concurrent_invocations cannot be 0".to_string(),
        ));
    }

    Ok(())
}
