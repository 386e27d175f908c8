//! Assumption and outcome types
//!
//! These are the request-scoped values that flow between the parser, the
//! executor and the response/audit layers.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A caller's declared expectation about one field of one filtered row.
///
/// Only the parser builds these, after every identifier and the operator
/// have passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    pub table: String,
    pub field: String,
    pub expected_value: Value,
    /// Canonical operator token (e.g. `==`, `%like%`, `IS NULL`)
    pub operator: String,
    /// Equality predicates, in payload order
    pub filter: Vec<(String, Value)>,
}

/// A single fetched row (indexed by column name, in select order)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Looks up a column, falling back to a case-insensitive match since
    /// MySQL may echo column names in the table's declared case.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(column))
            })
            .map(|(_, value)| value)
    }
}

/// Result of evaluating one assumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionOutcome {
    pub matched: bool,
    /// Row-store wall-clock time only
    pub elapsed_ms: f64,
    pub row_count: u64,
    /// Present only when a row was found
    pub actual_value: Option<Value>,
    /// Present only when a row was found
    pub expected_value: Option<Value>,
}

impl AssumptionOutcome {
    pub fn not_found(elapsed_ms: f64) -> Self {
        Self {
            matched: false,
            elapsed_ms: elapsed_ms.max(0.0),
            row_count: 0,
            actual_value: None,
            expected_value: None,
        }
    }

    pub fn found(matched: bool, elapsed_ms: f64, actual: Value, expected: Value) -> Self {
        Self {
            matched,
            elapsed_ms: elapsed_ms.max(0.0),
            row_count: 1,
            actual_value: Some(actual),
            expected_value: Some(expected),
        }
    }
}
