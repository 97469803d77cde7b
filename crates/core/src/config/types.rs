use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

/// Where per-job staging directories live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingConfig {
    /// Root directory; each job gets `<root>/<job_id>`.
    #[serde(default = "default_staging_root")]
    pub root: PathBuf,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            root: default_staging_root(),
        }
    }
}

fn default_staging_root() -> PathBuf {
    std::env::temp_dir().join("clipforge")
}

/// Upstream renderer and remote fetch settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL of the renderer that serves `/video/{reference}`.
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    /// Timeout for a single remote fetch in seconds (default: 120)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_upstream_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_fetch_timeout() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[staging]
root = "/srv/clipforge"

[upstream]
base_url = "http://renderer:8000"
fetch_timeout_secs = 30

[engine]
ffmpeg_path = "/usr/local/bin/ffmpeg"
encode_timeout_secs = 300
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.staging.root, PathBuf::from("/srv/clipforge"));
        assert_eq!(config.upstream.base_url, "http://renderer:8000");
        assert_eq!(config.upstream.fetch_timeout_secs, 30);
        assert_eq!(config.engine.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.engine.encode_timeout_secs, 300);
        // Untouched engine fields keep their defaults
        assert_eq!(config.engine.probe_timeout_secs, 30);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.upstream.fetch_timeout_secs, 120);
        assert!(config.staging.root.ends_with("clipforge"));
    }
}
