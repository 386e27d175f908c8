// SPDX-License-Identifier: Apache-2.0

//! Core types shared by every assumption-gate crate.

pub mod error;
pub mod types;
pub mod value;

pub use error::{AuthFailure, GateError, GateResult};
pub use types::{Assumption, AssumptionOutcome, Row};
pub use value::Value;
