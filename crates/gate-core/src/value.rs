// SPDX-License-Identifier: Apache-2.0

//! Scalar value representation
//!
//! Assumptions compare a single stored column against a single expected
//! scalar, so only JSON scalars are modelled. Comparisons are deliberately
//! loose: a numeric string and a number with the same magnitude are equal,
//! which is what the test harnesses driving this service rely on.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Universal scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    fn compare(self, other: Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

/// Parses a numeric string (`"42"`, `" -1.5 "`, `"1e3"`).
///
/// Words like `inf` or `NaN` are not numeric even though `f64` accepts them.
fn parse_numeric(text: &str) -> Option<Numeric> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Numeric::Int(i));
    }
    let plausible = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && trimmed.chars().any(|c| c.is_ascii_digit());
    if !plausible {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Numeric::Float)
}

impl Value {
    /// Converts a decoded JSON value. Arrays and objects are not scalars.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used for pattern matching. `Null` has none.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty() && s != "0",
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            Value::Int(i) => Some(Numeric::Int(*i)),
            Value::Float(f) => Some(Numeric::Float(*f)),
            Value::Text(s) => parse_numeric(s),
            Value::Null | Value::Bool(_) => None,
        }
    }

    /// Loose equality.
    ///
    /// - `null` equals `null`, `false`, `0` and `""`
    /// - booleans compare against the other side's truthiness
    /// - numbers and numeric strings compare by magnitude (`"1" == 1`, `"1.0" == "1"`)
    /// - anything else compares as text
    pub fn loose_eq(&self, other: &Value) -> bool {
        self.loose_cmp(other) == Some(Ordering::Equal)
    }

    /// Natural ordering across scalar types, following the same coercions as
    /// [`Value::loose_eq`]. Returns `None` when the operands cannot be ordered
    /// (e.g. a NaN float).
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                Some(self.truthy().cmp(&other.truthy()))
            }
            (Value::Null, Value::Text(s)) => Some("".cmp(s.as_str())),
            (Value::Text(s), Value::Null) => Some(s.as_str().cmp("")),
            (Value::Null, _) | (_, Value::Null) => Some(self.truthy().cmp(&other.truthy())),
            (Value::Text(a), Value::Text(b)) => match (parse_numeric(a), parse_numeric(b)) {
                (Some(x), Some(y)) => x.compare(y),
                _ => Some(a.cmp(b)),
            },
            _ => match (self.numeric(), other.numeric()) {
                (Some(x), Some(y)) => x.compare(y),
                // A number against non-numeric text compares as text.
                _ => {
                    let left = self.render().unwrap_or_default();
                    let right = other.render().unwrap_or_default();
                    Some(left.cmp(&right))
                }
            },
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
