//! Effective requester configuration
//!
//! Merges the layers, records where each contributing file came from, and
//! validates the result into typed settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use dlc_ticket_protocol::MAX_TIMEOUT_SECS;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::retry::{Attempts, RetryPolicy};

/// Repo config location, relative to the working directory
pub const REPO_CONFIG_PATH: &str = ".dlc/requester.toml";

/// Host config location, relative to `$HOME`
pub const HOST_CONFIG_PATH: &str = ".config/dlc/requester.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Repo,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Errors while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    timeout_seconds: i64,
    query: RawQuery,
    store: RawStore,
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    max_attempts: i64,
    retry_gap_ms: i64,
}

#[derive(Debug, Deserialize)]
struct RawStore {
    root: String,
}

/// Validated requester settings
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    /// Requested TIMEOUT_LIMIT; clamped to the protocol maximum when used.
    pub timeout_seconds: u64,
    /// Status query retry policy
    pub retry: RetryPolicy,
    /// Root of the filesystem store
    pub store_root: PathBuf,
    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            timeout_seconds: defaults.timeout_seconds,
            retry: RetryPolicy::default(),
            store_root: PathBuf::from(defaults.store_root),
            sources: vec![ConfigSource {
                origin: ConfigOrigin::Builtin,
                path: None,
                digest: None,
            }],
        }
    }
}

impl RequesterConfig {
    /// Build from layers. Missing files are skipped.
    pub fn load(
        host_config_path: Option<&Path>,
        repo_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        for (origin, path) in [
            (ConfigOrigin::Host, host_config_path),
            (ConfigOrigin::Repo, repo_config_path),
        ] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let (value, digest) = load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        Self::from_value(merge_layers(layers), sources)
    }

    /// Host config path under `$HOME`, if `HOME` is set
    pub fn default_host_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(HOST_CONFIG_PATH))
    }

    fn from_value(merged: Value, sources: Vec<ConfigSource>) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_value(merged).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if raw.timeout_seconds <= 0 {
            return Err(ConfigError::Invalid(format!(
                "timeout_seconds must be positive, got {}",
                raw.timeout_seconds
            )));
        }
        let attempts = u32::try_from(raw.query.max_attempts)
            .ok()
            .and_then(Attempts::new)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "query.max_attempts must be at least 1, got {}",
                    raw.query.max_attempts
                ))
            })?;
        let gap_ms = u64::try_from(raw.query.retry_gap_ms).map_err(|_| {
            ConfigError::Invalid(format!(
                "query.retry_gap_ms must not be negative, got {}",
                raw.query.retry_gap_ms
            ))
        })?;
        if raw.store.root.is_empty() {
            return Err(ConfigError::Invalid("store.root must not be empty".to_string()));
        }

        Ok(Self {
            timeout_seconds: raw.timeout_seconds as u64,
            retry: RetryPolicy {
                attempts,
                gap: Duration::from_millis(gap_ms),
            },
            store_root: PathBuf::from(raw.store.root),
            sources,
        })
    }

    /// Timeout actually written to tickets
    pub fn effective_timeout(&self) -> u64 {
        self.timeout_seconds.clamp(1, MAX_TIMEOUT_SECS)
    }
}

/// Parse a TOML file into a JSON value plus its digest
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let display = path.to_string_lossy().to_string();
    let bytes = fs::read(path).map_err(|e| ConfigError::Io {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
        path: display.clone(),
        message: format!("invalid UTF-8: {}", e),
    })?;
    let table: toml::Value = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: display.clone(),
        message: e.to_string(),
    })?;
    let value = serde_json::to_value(table).map_err(|e| ConfigError::Parse {
        path: display,
        message: e.to_string(),
    })?;

    Ok((value, digest))
}
