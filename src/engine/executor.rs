//! Query Executor
//!
//! Runs one validated assumption against a row store and decides whether the
//! stored value satisfies it.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use gate_core::{Assumption, AssumptionOutcome, GateError, GateResult};
use gate_query::LookupQuery;

use crate::engine::registry::OperatorRegistry;
use crate::engine::traits::RowStore;

/// Evaluates assumptions with a bounded row-store call
pub struct QueryExecutor<'a> {
    registry: &'a OperatorRegistry,
    timeout: Duration,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(registry: &'a OperatorRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Fetches the requested field from at most one filtered row and compares
    /// it with the expected value.
    ///
    /// `elapsed_ms` covers the row-store call only. A timeout is an error,
    /// never a non-match; dropping the returned future drops the in-flight
    /// store call with it.
    pub async fn execute(
        &self,
        assumption: &Assumption,
        store: &dyn RowStore,
    ) -> GateResult<AssumptionOutcome> {
        let strategy = self.registry.resolve(&assumption.operator)?;
        let query = LookupQuery::for_assumption(assumption);

        let started = Instant::now();
        let fetched = tokio::time::timeout(self.timeout, store.fetch_one(&query)).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let row = match fetched {
            Ok(result) => result?,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(
                    table = %assumption.table,
                    driver = store.driver_id(),
                    timeout_ms,
                    "Row store call timed out"
                );
                return Err(GateError::timeout(timeout_ms));
            }
        };

        let Some(row) = row else {
            debug!(table = %assumption.table, elapsed_ms, "No row matched the filter");
            return Ok(AssumptionOutcome::not_found(elapsed_ms));
        };

        let actual = row.get(&assumption.field).cloned().ok_or_else(|| {
            GateError::internal(format!(
                "Row store returned no column '{}' for table '{}'",
                assumption.field, assumption.table
            ))
        })?;

        let matched = strategy.compare(&actual, &assumption.expected_value);
        debug!(
            table = %assumption.table,
            field = %assumption.field,
            operator = %assumption.operator,
            matched,
            elapsed_ms,
            "Assumption evaluated"
        );

        Ok(AssumptionOutcome::found(
            matched,
            elapsed_ms,
            actual,
            assumption.expected_value.clone(),
        ))
    }
}
