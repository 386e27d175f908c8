//! Interceptor Types
//!
//! Type definitions for the audit trail.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gate_core::AuthFailure;

/// What happened to one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    RequestSucceeded {
        table: String,
        field: String,
        operator: String,
        matched: bool,
        row_count: u64,
        elapsed_ms: f64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        suspicious: Vec<String>,
    },
    AuthenticationFailed {
        reason: AuthFailure,
        /// Redacted form only (prefix…suffix)
        credential: String,
    },
    ValidationFailed {
        message: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        suspicious: Vec<String>,
    },
    InternalError {
        #[serde(default)]
        table: Option<String>,
        #[serde(default)]
        field: Option<String>,
        /// Full backend detail; never sent to the caller
        detail: String,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestSucceeded { .. } => "request_succeeded",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::InternalError { .. } => "internal_error",
        }
    }
}

/// An entry in the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique identifier
    pub id: String,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
    /// Request the event belongs to
    pub request_id: String,
    /// Caller network address
    pub address: String,
    /// Allow-list label, once the caller is authenticated
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub event: AuditEvent,
}

impl AuditLogEntry {
    pub fn new(
        request_id: impl Into<String>,
        address: impl Into<String>,
        label: Option<String>,
        event: AuditEvent,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            request_id: request_id.into(),
            address: address.into(),
            label,
            event,
        }
    }
}

/// Configuration for the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit entries are written to disk
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory holding `audit.jsonl`; in-memory only when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Maximum number of audit log entries to retain
    #[serde(default = "default_max_audit_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_audit_entries() -> usize {
    10000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            max_entries: default_max_audit_entries(),
        }
    }
}
