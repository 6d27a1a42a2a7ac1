//! Shared configuration for hosts embedding the reconciliation engine.
//!
//! Layered loading (built-in defaults, a TOML file, `ZABBLY_*`
//! environment variables), translation to
//! [`zabbly_core::ReconcilerConfig`], and tracing setup.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use zabbly_api::ApiVersion;
use zabbly_core::ReconcilerConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("invalid server_version: {0}")]
    Version(#[from] zabbly_api::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Pin the remote API version instead of using the reported one,
    /// e.g. "4.0" or "5.0.2".
    #[serde(default)]
    pub server_version: Option<String>,

    /// Queue every RPC call behind one lock.
    #[serde(default)]
    pub serialize_requests: bool,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_version: None,
            serialize_requests: false,
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "warn".into()
}

impl Config {
    /// Engine settings for a remote reporting `reported`. A configured
    /// `server_version` takes precedence.
    pub fn reconciler_config(
        &self,
        reported: Option<ApiVersion>,
    ) -> Result<ReconcilerConfig, ConfigError> {
        let version = match (self.server_version.as_deref(), reported) {
            (Some(pinned), _) => ApiVersion::parse(pinned.trim())?,
            (None, Some(reported)) => reported,
            (None, None) => {
                return Err(ConfigError::Validation {
                    field: "server_version".into(),
                    reason: "not configured and not reported by the server".into(),
                });
            }
        };
        Ok(ReconcilerConfig {
            version,
            serialize_requests: self.serialize_requests,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "zabbly", "zabbly").map_or_else(
        || PathBuf::from(".zabbly").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` plus environment. A missing file yields
/// the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ZABBLY_"))
        .extract()?;
    Ok(config)
}

// ── Tracing ─────────────────────────────────────────────────────────

/// Install a fmt subscriber. `RUST_LOG` overrides `filter`; an already
/// installed global subscriber is left in place.
pub fn init_tracing(filter: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .try_init()
        .is_ok();
    debug!(installed, filter, "tracing initialised");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let (_dir, path) = write(
            r#"
            server_version = "4.0"
            serialize_requests = true
            "#,
        );
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.server_version.as_deref(), Some("4.0"));
        assert!(config.serialize_requests);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn malformed_file_is_a_figment_error() {
        let (_dir, path) = write("serialize_requests = \"often\"");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
    }

    #[test]
    fn pinned_version_wins_over_reported() {
        let config = Config {
            server_version: Some("4.4".into()),
            serialize_requests: true,
            ..Config::default()
        };
        let engine = config
            .reconciler_config(Some(ApiVersion::new(5, 0, 0)))
            .unwrap();
        assert_eq!(engine.version, ApiVersion::new(4, 4, 0));
        assert!(engine.serialize_requests);
    }

    #[test]
    fn reported_version_is_used_when_not_pinned() {
        let engine = Config::default()
            .reconciler_config(Some(ApiVersion::new(5, 2, 1)))
            .unwrap();
        assert_eq!(engine.version, ApiVersion::new(5, 2, 1));
        assert!(!engine.serialize_requests);
    }

    #[test]
    fn version_must_come_from_somewhere() {
        let err = Config::default().reconciler_config(None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));

        let config = Config {
            server_version: Some("five".into()),
            ..Config::default()
        };
        let err = config.reconciler_config(None).unwrap_err();
        assert!(matches!(err, ConfigError::Version(_)));
    }

    #[test]
    fn config_renders_back_to_toml() {
        let config = Config {
            server_version: Some("5.0".into()),
            ..Config::default()
        };
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
