// SPDX-License-Identifier: Apache-2.0

//! Service configuration
//!
//! Loaded once at startup from an optional JSON file, then overridden by
//! `ASSUMPTION_GATE_*` environment variables, then validated into an
//! immutable allow-list.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AllowListEntry;
use crate::interceptor::AuditConfig;
use crate::observability::Sensitive;

pub const ENV_CONFIG_PATH: &str = "ASSUMPTION_GATE_CONFIG";
pub const ENV_ENABLED: &str = "ASSUMPTION_GATE_ENABLED";
pub const ENV_BIND_ADDR: &str = "ASSUMPTION_GATE_BIND_ADDR";
pub const ENV_DATABASE_URL: &str = "ASSUMPTION_GATE_DATABASE_URL";
pub const ENV_QUERY_TIMEOUT_MS: &str = "ASSUMPTION_GATE_QUERY_TIMEOUT_MS";
pub const ENV_AUDIT_DIR: &str = "ASSUMPTION_GATE_AUDIT_DIR";
pub const ENV_LOG_DIR: &str = "ASSUMPTION_GATE_LOG_DIR";

const MAX_QUERY_TIMEOUT_MS: u64 = 60_000;

/// Startup configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {name}: {message}")]
    InvalidEnv { name: &'static str, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to open row store: {0}")]
    RowStore(#[source] gate_core::GateError),

    #[error("Failed to open audit log: {0}")]
    Audit(#[source] std::io::Error),
}

/// One allow-list entry as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowListConfig {
    pub address: String,
    pub credential: Sensitive<String>,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Off unless explicitly switched on
    pub enabled: bool,
    pub bind_addr: SocketAddr,
    /// `mysql://...` or `sqlite:...`
    pub database_url: Option<Sensitive<String>>,
    pub query_timeout_ms: u64,
    pub max_connections: u32,
    pub allow_list: Vec<AllowListConfig>,
    pub audit: AuditConfig,
    pub log_dir: Option<PathBuf>,
    pub log_json: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            database_url: None,
            query_timeout_ms: 5000,
            max_connections: 4,
            allow_list: Vec::new(),
            audit: AuditConfig::default(),
            log_dir: None,
            log_json: false,
        }
    }
}

impl GateConfig {
    /// Reads the file (when given) and applies process environment overrides.
    ///
    /// Without an explicit path, `ASSUMPTION_GATE_CONFIG` is consulted.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `ASSUMPTION_GATE_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ENABLED) {
            self.enabled = parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                name: ENV_ENABLED,
                message: "expected true/false".to_string(),
            })?;
        }
        if let Some(raw) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_BIND_ADDR,
                message: "expected host:port".to_string(),
            })?;
        }
        if let Some(raw) = lookup(ENV_DATABASE_URL) {
            self.database_url = Some(Sensitive::new(raw.trim().to_string()));
        }
        if let Some(raw) = lookup(ENV_QUERY_TIMEOUT_MS) {
            self.query_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_QUERY_TIMEOUT_MS,
                message: "expected milliseconds".to_string(),
            })?;
        }
        if let Some(raw) = lookup(ENV_AUDIT_DIR) {
            self.audit.directory = Some(PathBuf::from(raw.trim()));
        }
        if let Some(raw) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(raw.trim()));
        }
        Ok(())
    }

    /// Validates settings and builds the allow-list.
    ///
    /// Entry errors name the entry's label, never its credential.
    pub fn allow_list_entries(&self) -> Result<Vec<AllowListEntry>, ConfigError> {
        if self.query_timeout_ms == 0 || self.query_timeout_ms > MAX_QUERY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "query_timeout_ms must be between 1 and {MAX_QUERY_TIMEOUT_MS}"
            )));
        }

        let mut labels = HashSet::new();
        let mut entries = Vec::with_capacity(self.allow_list.len());
        for raw in &self.allow_list {
            if !labels.insert(raw.label.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate allow-list label '{}'",
                    raw.label
                )));
            }
            let entry = AllowListEntry::new(
                raw.address.as_str(),
                raw.credential.expose().as_str(),
                raw.label.as_str(),
            )
            .map_err(|e| ConfigError::Invalid(e.public_message()))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
