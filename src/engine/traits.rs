//! RowStore trait definition
//!
//! The single abstraction every backing database implements. The service only
//! ever reads at most one row, so the surface is deliberately small.

use async_trait::async_trait;

use gate_core::{GateResult, Row};
use gate_query::{LookupQuery, SqlDialect};

/// Read-only access to the tables assumptions are checked against
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Returns the unique identifier for this driver (e.g., "mysql", "sqlite")
    fn driver_id(&self) -> &'static str;

    /// SQL dialect used to render lookups for this store
    fn dialect(&self) -> SqlDialect;

    /// Runs the lookup and returns the first matching row, if any.
    ///
    /// Backend failures are reported as [`gate_core::GateError::Internal`]
    /// carrying the driver's message; callers never forward it verbatim.
    async fn fetch_one(&self, query: &LookupQuery) -> GateResult<Option<Row>>;

    /// Checks that the store is reachable
    async fn ping(&self) -> GateResult<()>;

    /// Releases pooled connections
    async fn close(&self);
}
