//! Bootstrap configuration and config file resolution
//!
//! Config file location priority:
//! 1. Command-line argument (highest priority)
//! 2. `CRS_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/crs/config.toml`)
//! 4. Compiled defaults (no file)
//!
//! A missing file at the platform default location is not fatal: the service
//! starts with defaults. A file named explicitly (CLI or `CRS_CONFIG`) must
//! exist. A file that exists but does not parse is an error.
//!
//! Loading does no logging of its own; callers report the returned
//! `ConfigSource` once tracing is up.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "CRS_CONFIG";

/// Service configuration loaded from TOML
///
/// These settings are read once; restart to pick up changes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Interface to bind
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the trained artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Sessions idle longer than this are discarded
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_session_idle_minutes() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where `ServiceConfig::load` found its settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at the default location; `None` when the platform has no
    /// config directory
    Defaults(Option<PathBuf>),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults(Some(path)) => {
                write!(f, "compiled defaults (no file at {})", path.display())
            }
            ConfigSource::Defaults(None) => write!(f, "compiled defaults (no config directory)"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_port(),
            artifacts_dir: default_artifacts_dir(),
            session_idle_minutes: default_session_idle_minutes(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the config file location and load it, falling back to defaults
    pub fn load(cli_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let explicit = cli_path.is_some() || std::env::var_os(CONFIG_ENV_VAR).is_some();
        match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                let config = Self::from_file(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            Some(path) if explicit => Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            ))),
            missing => Ok((Self::default(), ConfigSource::Defaults(missing))),
        }
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes.saturating_mul(60))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.session_idle_minutes == 0 {
            return Err(Error::Config(
                "session_idle_minutes must be greater than 0".to_string(),
            ));
        }
        if self.session_idle_minutes.checked_mul(60).is_none() {
            return Err(Error::Config(format!(
                "session_idle_minutes is too large: {}",
                self.session_idle_minutes
            )));
        }
        if self.bind_host.trim().is_empty() {
            return Err(Error::Config("bind_host must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Config file path by priority: CLI → env var → platform default
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: platform config directory
    default_config_path()
}

/// `~/.config/crs/config.toml` on Linux, the platform equivalent elsewhere
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("crs").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_addr(), "127.0.0.1:5780");
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_full_file() {
        let config = ServiceConfig::from_toml_str(
            r#"
            bind_host = "0.0.0.0"
            port = 8080
            artifacts_dir = "/srv/crs/artifacts"
            session_idle_minutes = 15

            [logging]
            level = "debug"
            file = "/var/log/crs.log"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.artifacts_dir, PathBuf::from("/srv/crs/artifacts"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/crs.log")));
    }

    #[test]
    fn test_rejects_zero_idle_timeout() {
        assert!(ServiceConfig::from_toml_str("session_idle_minutes = 0").is_err());
    }

    #[test]
    fn test_rejects_idle_timeout_that_overflows_seconds() {
        let err = ServiceConfig::from_toml_str("session_idle_minutes = 9223372036854775807")
            .unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");

        let config = ServiceConfig::from_toml_str("session_idle_minutes = 525600").unwrap();
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(525_600 * 60));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(ServiceConfig::from_toml_str("prot = 80").is_err());
    }
}
