// assumption-gate - authenticated assumption checks against a live database
// Core library

pub mod auth;
pub mod commands;
pub mod config;
pub mod engine;
pub mod http;
pub mod interceptor;
pub mod metrics;
pub mod observability;

use std::sync::Arc;
use std::time::Duration;

use auth::AuthGate;
use config::{ConfigError, GateConfig};
use engine::{connect_row_store, OperatorRegistry, RowStore};
use interceptor::AuditRecorder;
use metrics::GateMetrics;

pub type SharedState = Arc<AppState>;

/// Everything a request needs. Built once at startup and never mutated;
/// only the audit ring and the metric counters change underneath it.
pub struct AppState {
    pub enabled: bool,
    pub gate: AuthGate,
    pub registry: OperatorRegistry,
    pub store: Arc<dyn RowStore>,
    pub audit: Arc<AuditRecorder>,
    pub metrics: GateMetrics,
    pub query_timeout: Duration,
}

impl AppState {
    pub fn new(
        enabled: bool,
        gate: AuthGate,
        store: Arc<dyn RowStore>,
        audit: Arc<AuditRecorder>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            enabled,
            gate,
            registry: OperatorRegistry::with_defaults(),
            store,
            audit,
            metrics: GateMetrics::new(),
            query_timeout,
        }
    }

    /// Validates `config`, opens the row store and the audit log.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn from_config(config: &GateConfig) -> Result<Self, ConfigError> {
        let entries = config.allow_list_entries()?;
        let database_url = config
            .database_url
            .as_ref()
            .ok_or_else(|| ConfigError::Invalid("database_url is required".to_string()))?;

        let store = connect_row_store(database_url.expose(), config.max_connections)
            .await
            .map_err(ConfigError::RowStore)?;
        let audit = AuditRecorder::from_config(&config.audit).map_err(ConfigError::Audit)?;

        if config.enabled && entries.is_empty() {
            tracing::warn!("Endpoint enabled with an empty allow-list; every call will be refused");
        }

        Ok(Self::new(
            config.enabled,
            AuthGate::new(entries),
            store,
            Arc::new(audit),
            config.query_timeout(),
        ))
    }
}
