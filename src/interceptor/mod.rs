//! Request Interceptor
//!
//! Everything that observes a request without taking part in the decision:
//! - **Audit**: structured, non-blocking recording of every outcome
//! - **Safety**: suspicious-pattern annotation for audit entries

pub mod audit;
pub mod safety;
pub mod types;

pub use audit::{AuditRecorder, JsonlAuditSink};
pub use types::*;
