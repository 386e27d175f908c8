//! Request handlers
//!
//! Transport-independent entry points used by the HTTP shell.

pub mod assumption;
pub mod metrics;

pub use assumption::{handle_assumption, AssumptionReport, AssumptionResponse};
pub use metrics::{get_metrics, MetricsResponse};
