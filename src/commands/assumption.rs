//! Assumption command
//!
//! `handle_assumption` runs the whole pipeline for one request:
//! authenticate, decode, parse, execute, then audit. Every outcome is
//! audited and counted; the caller only ever sees the status and a body.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::{error, field, info, instrument, warn, Span};
use uuid::Uuid;

use gate_core::{AuthFailure, GateError, Value};

use crate::auth::AuthenticatedCaller;
use crate::engine::{AssumptionParser, QueryExecutor};
use crate::interceptor::safety::{scan_assumption, scan_payload};
use crate::interceptor::{AuditEvent, AuditLogEntry};
use crate::observability::redact_credential;
use crate::AppState;

/// Status code plus JSON body, independent of the transport
#[derive(Debug, Clone, PartialEq)]
pub struct AssumptionResponse {
    pub status: u16,
    pub body: JsonValue,
}

impl AssumptionResponse {
    fn failure(err: &GateError) -> Self {
        Self {
            status: err.status_code(),
            body: json!({ "error": err.public_message() }),
        }
    }
}

/// Body of a 200 response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssumptionReport {
    pub assumption: bool,
    pub query_time_ms: f64,
    pub matched_rows: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<Value>,
}

/// Handles one assumption request from `address`.
///
/// A missing credential is treated like a wrong one.
#[instrument(
    skip(state, credential, raw_body),
    fields(request_id = field::Empty, body_len = raw_body.len())
)]
pub async fn handle_assumption(
    state: &AppState,
    address: &str,
    credential: Option<&str>,
    raw_body: &[u8],
) -> AssumptionResponse {
    let request_id = Uuid::new_v4().to_string();
    Span::current().record("request_id", field::display(&request_id));
    let credential = credential.unwrap_or_default();

    let caller = match authenticate(state, address, credential) {
        Ok(caller) => caller,
        Err(err) => {
            let reason = match &err {
                GateError::Unauthorized { reason } => *reason,
                _ => AuthFailure::InvalidCredential,
            };
            warn!(reason = reason.as_str(), "Authentication failed");
            state.metrics.record_auth_failure();
            state.audit.record(AuditLogEntry::new(
                &request_id,
                address,
                None,
                AuditEvent::AuthenticationFailed {
                    reason,
                    credential: redact_credential(credential),
                },
            ));
            return AssumptionResponse::failure(&err);
        }
    };

    let payload: JsonValue = match serde_json::from_slice(raw_body) {
        Ok(payload) => payload,
        Err(_) => {
            let err = GateError::validation("request body must be a JSON object");
            return validation_failed(state, &request_id, &caller, &err, Vec::new());
        }
    };

    let parser = AssumptionParser::new(&state.registry);
    let assumption = match parser.parse(&payload) {
        Ok(assumption) => assumption,
        Err(err) => {
            let suspicious = scan_payload(&payload);
            return validation_failed(state, &request_id, &caller, &err, suspicious);
        }
    };
    let suspicious = scan_assumption(&assumption);
    if !suspicious.is_empty() {
        warn!(patterns = ?suspicious, "Suspicious values in assumption");
    }

    let executor = QueryExecutor::new(&state.registry, state.query_timeout);
    match executor.execute(&assumption, state.store.as_ref()).await {
        Ok(outcome) => {
            info!(
                label = %caller.label,
                table = %assumption.table,
                field = %assumption.field,
                matched = outcome.matched,
                elapsed_ms = outcome.elapsed_ms,
                "Assumption checked"
            );
            state
                .metrics
                .record_success(outcome.matched, outcome.elapsed_ms);
            state.audit.record(AuditLogEntry::new(
                &request_id,
                address,
                Some(caller.label.clone()),
                AuditEvent::RequestSucceeded {
                    table: assumption.table.clone(),
                    field: assumption.field.clone(),
                    operator: assumption.operator.clone(),
                    matched: outcome.matched,
                    row_count: outcome.row_count,
                    elapsed_ms: outcome.elapsed_ms,
                    suspicious,
                },
            ));

            let report = AssumptionReport {
                assumption: outcome.matched,
                query_time_ms: outcome.elapsed_ms,
                matched_rows: outcome.row_count,
                actual_value: outcome.actual_value,
                expected_value: outcome.expected_value,
            };
            match serde_json::to_value(&report) {
                Ok(body) => AssumptionResponse { status: 200, body },
                Err(e) => AssumptionResponse::failure(&GateError::internal(e.to_string())),
            }
        }
        Err(err) if err.status_code() == 400 => {
            validation_failed(state, &request_id, &caller, &err, suspicious)
        }
        Err(err) => {
            error!(
                label = %caller.label,
                table = %assumption.table,
                field = %assumption.field,
                error = %err,
                "Assumption check failed"
            );
            state
                .metrics
                .record_internal_error(matches!(err, GateError::Timeout { .. }));
            state.audit.record(AuditLogEntry::new(
                &request_id,
                address,
                Some(caller.label.clone()),
                AuditEvent::InternalError {
                    table: Some(assumption.table.clone()),
                    field: Some(assumption.field.clone()),
                    detail: err.to_string(),
                },
            ));
            AssumptionResponse::failure(&err)
        }
    }
}

fn authenticate(
    state: &AppState,
    address: &str,
    credential: &str,
) -> Result<AuthenticatedCaller, GateError> {
    if !state.enabled {
        return Err(GateError::unauthorized(AuthFailure::Disabled));
    }
    state.gate.authenticate(address, credential)
}

fn validation_failed(
    state: &AppState,
    request_id: &str,
    caller: &AuthenticatedCaller,
    err: &GateError,
    suspicious: Vec<String>,
) -> AssumptionResponse {
    info!(label = %caller.label, error = %err, "Assumption rejected");
    state.metrics.record_validation_failure();
    state.audit.record(AuditLogEntry::new(
        request_id,
        caller.address.as_str(),
        Some(caller.label.clone()),
        AuditEvent::ValidationFailed {
            message: err.public_message(),
            suspicious,
        },
    ));
    AssumptionResponse::failure(err)
}
