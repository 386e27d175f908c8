//! Lightweight in-process outcome counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one service instance. Row-store time is kept in microseconds.
#[derive(Debug, Default)]
pub struct GateMetrics {
    total: AtomicU64,
    succeeded: AtomicU64,
    matched: AtomicU64,
    auth_failures: AtomicU64,
    validation_failures: AtomicU64,
    internal_errors: AtomicU64,
    timeouts: AtomicU64,
    store_total_us: AtomicU64,
    store_max_us: AtomicU64,
}

impl GateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, matched: bool, store_ms: f64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        if matched {
            self.matched.fetch_add(1, Ordering::Relaxed);
        }
        self.record_store_time(store_ms);
    }

    pub fn record_auth_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Timeouts count as internal errors as well.
    pub fn record_internal_error(&self, timed_out: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_store_time(&self, store_ms: f64) {
        let micros = (store_ms.max(0.0) * 1000.0) as u64;
        self.store_total_us.fetch_add(micros, Ordering::Relaxed);

        let mut current = self.store_max_us.load(Ordering::Relaxed);
        while micros > current {
            match self.store_max_us.compare_exchange(
                current,
                micros,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(next) => current = next,
            }
        }
    }

    pub fn snapshot(&self) -> GateMetricsSnapshot {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let store_total_us = self.store_total_us.load(Ordering::Relaxed);
        let store_max_us = self.store_max_us.load(Ordering::Relaxed);

        let avg_store_ms = if succeeded > 0 {
            Some(store_total_us as f64 / 1000.0 / succeeded as f64)
        } else {
            None
        };

        GateMetricsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            succeeded,
            matched: self.matched.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            store_time_total_ms: store_total_us as f64 / 1000.0,
            avg_store_ms,
            max_store_ms: if succeeded > 0 {
                Some(store_max_us as f64 / 1000.0)
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateMetricsSnapshot {
    pub total: u64,
    pub succeeded: u64,
    pub matched: u64,
    pub auth_failures: u64,
    pub validation_failures: u64,
    pub internal_errors: u64,
    pub timeouts: u64,
    pub store_time_total_ms: f64,
    pub avg_store_ms: Option<f64>,
    pub max_store_ms: Option<f64>,
}
