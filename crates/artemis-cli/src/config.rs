//! Client configuration at `~/.artemis/config.toml`.
//!
//! Provides the default host, port, and keepalive settings.
//! CLI flags always override config file values.

use anyhow::{Context, Result};
use artemis_client::ConnectConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Default connection settings.
    #[serde(default)]
    pub default: DefaultConfig,
}

/// Default connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultConfig {
    /// Host used by a bare `connect` (empty = none).
    #[serde(default)]
    pub host: String,

    /// Server port when the host carries none.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Client heartbeat interval in seconds (0 = disabled).
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            heartbeat_secs: default_heartbeat_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    artemis_core::DEFAULT_PORT
}

fn default_heartbeat_secs() -> u64 {
    3
}

fn default_timeout_secs() -> u64 {
    10
}

/// `~/.artemis/config.toml`, or a relative fallback without a home directory.
pub fn default_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_default();
    home.join(".artemis").join("config.toml")
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Transport settings, with `port_override` (from `--port`) taking
    /// precedence over the file.
    pub fn connect_config(&self, port_override: Option<u16>) -> ConnectConfig {
        ConnectConfig {
            default_port: port_override.unwrap_or(self.default.port),
            heartbeat_interval_secs: self.default.heartbeat_secs,
            timeout_secs: self.default.timeout_secs,
        }
    }

    /// The configured default host, if any.
    pub fn default_host(&self) -> Option<&str> {
        let host = self.default.host.trim();
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.default.port, 2010);
        assert_eq!(cfg.default.heartbeat_secs, 3);
        assert_eq!(cfg.default.timeout_secs, 10);
        assert!(cfg.default_host().is_none());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[default]
host = "bridge.local"
port = 3000
heartbeat_secs = 0
timeout_secs = 2
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.default_host(), Some("bridge.local"));
        let connect = cfg.connect_config(None);
        assert_eq!(connect.default_port, 3000);
        assert_eq!(connect.heartbeat_interval_secs, 0);
        assert_eq!(connect.timeout_secs, 2);
    }

    #[test]
    fn parse_partial_toml_config() {
        let toml_str = r#"
[default]
host = "bridge.local"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.default.port, 2010); // default
        assert_eq!(cfg.default.heartbeat_secs, 3); // default
    }

    #[test]
    fn port_flag_overrides_file() {
        let cfg = Config::default();
        assert_eq!(cfg.connect_config(Some(4000)).default_port, 4000);
        assert_eq!(cfg.connect_config(None).default_port, 2010);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.default_host().is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[default]\nhost = \"10.0.0.5:2011\"\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.default_host(), Some("10.0.0.5:2011"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[default\nhost = ").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }
}
