//! Metrics commands.

use serde::Serialize;

use crate::metrics::GateMetricsSnapshot;
use crate::AppState;

/// Response wrapper for metrics snapshot
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub success: bool,
    pub metrics: GateMetricsSnapshot,
    pub driver: &'static str,
}

/// Returns the current counters.
pub fn get_metrics(state: &AppState) -> MetricsResponse {
    MetricsResponse {
        success: true,
        metrics: state.metrics.snapshot(),
        driver: state.store.driver_id(),
    }
}
