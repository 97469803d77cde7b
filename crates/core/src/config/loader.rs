use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides (e.g. `CLIPFORGE_UPSTREAM_BASE_URL`)
const ENV_PREFIX: &str = "CLIPFORGE_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

// Only the first underscore after the section splits, so keys such as
// `base_url` survive: CLIPFORGE_UPSTREAM_BASE_URL -> upstream.base_url
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| {
        let key = key.as_str();
        match key.split_once('_') {
            Some((section, rest)) => format!("{}.{}", section, rest).into(),
            None => key.to_string().into(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[server]
port = "not-a-number"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[upstream]
base_url = "http://renderer.internal:9000"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.upstream.base_url, "http://renderer.internal:9000");
        // Sections missing from the file fall back to defaults
        assert_eq!(config.engine.long_timeout_secs, 900);
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[upstream]
base_url = "http://from-file:8000"
"#,
            )?;
            jail.set_env("CLIPFORGE_UPSTREAM_BASE_URL", "http://from-env:8000");
            jail.set_env("CLIPFORGE_ENGINE_PROBE_TIMEOUT_SECS", "5");

            let config = load_config(Path::new("config.toml")).unwrap();
            assert_eq!(config.upstream.base_url, "http://from-env:8000");
            assert_eq!(config.engine.probe_timeout_secs, 5);
            Ok(())
        });
    }
}
