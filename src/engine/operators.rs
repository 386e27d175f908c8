// SPDX-License-Identifier: Apache-2.0

//! Operator strategies
//!
//! Each strategy answers `compare(actual, expected)` for the subset of
//! operator tokens it owns. Token → strategy binding lives in the
//! [`OperatorRegistry`](super::registry::OperatorRegistry).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use gate_core::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualityOp {
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingOp {
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternOp {
    Contains,
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOp {
    IsNull,
    IsNotNull,
}

/// Comparison behavior bound to an operator token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "op", rename_all = "snake_case")]
pub enum OperatorStrategy {
    /// Loose equality: `"1" == 1` holds
    Equality(EqualityOp),
    /// Natural ordering of the scalar types, numeric where both sides are numeric
    Ordering(OrderingOp),
    /// Case-insensitive substring tests
    PatternMatch(PatternOp),
    /// Ignores the expected value entirely
    NullCheck(NullOp),
}

impl OperatorStrategy {
    pub fn compare(&self, actual: &Value, expected: &Value) -> bool {
        match *self {
            OperatorStrategy::Equality(op) => {
                let equal = actual.loose_eq(expected);
                match op {
                    EqualityOp::Equal => equal,
                    EqualityOp::NotEqual => !equal,
                }
            }
            OperatorStrategy::Ordering(op) => match actual.loose_cmp(expected) {
                Some(ordering) => match op {
                    OrderingOp::Greater => ordering == Ordering::Greater,
                    OrderingOp::Less => ordering == Ordering::Less,
                    OrderingOp::GreaterOrEqual => ordering != Ordering::Less,
                    OrderingOp::LessOrEqual => ordering != Ordering::Greater,
                },
                None => false,
            },
            OperatorStrategy::PatternMatch(op) => {
                // Null on either side never matches a pattern.
                let (Some(actual), Some(expected)) = (actual.render(), expected.render()) else {
                    return false;
                };
                let actual = actual.to_lowercase();
                let expected = expected.to_lowercase();
                match op {
                    PatternOp::Contains => actual.contains(&expected),
                    PatternOp::Prefix => actual.starts_with(&expected),
                    PatternOp::Suffix => actual.ends_with(&expected),
                }
            }
            OperatorStrategy::NullCheck(op) => match op {
                NullOp::IsNull => actual.is_null(),
                NullOp::IsNotNull => !actual.is_null(),
            },
        }
    }
}
