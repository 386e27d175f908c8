//! Assumption Parser
//!
//! Turns a decoded request body into a validated [`Assumption`]:
//!
//! ```json
//! {"assumption": {"oxorder.oxordernr": 42, "operator": ">=", "where": {"oxid": "abc"}}}
//! ```
//!
//! Every identifier is whitelisted and the operator is resolved to its
//! canonical token before anything else sees the request. Payload values are
//! never echoed in error messages.

use serde_json::{Map, Value as JsonValue};

use gate_core::{Assumption, GateError, GateResult, Value};
use gate_sql::{validate_identifier, IdentifierRole};

use crate::engine::registry::{OperatorRegistry, DEFAULT_OPERATOR};

/// Top-level key carrying the assumption object
pub const ASSUMPTION_KEY: &str = "assumption";
/// Reserved key naming the comparison operator
pub const OPERATOR_KEY: &str = "operator";
/// Reserved key carrying the row filter
pub const WHERE_KEY: &str = "where";

/// Parses request payloads against a fixed operator registry
pub struct AssumptionParser<'a> {
    registry: &'a OperatorRegistry,
}

impl<'a> AssumptionParser<'a> {
    pub fn new(registry: &'a OperatorRegistry) -> Self {
        Self { registry }
    }

    /// Parses and validates a decoded payload.
    pub fn parse(&self, payload: &JsonValue) -> GateResult<Assumption> {
        let body = payload
            .get(ASSUMPTION_KEY)
            .and_then(JsonValue::as_object)
            .ok_or_else(|| GateError::validation("'assumption' must be an object"))?;

        let (path, expected) = Self::single_field_path(body)?;
        let (table, field) = Self::split_path(path)?;
        validate_identifier(table, IdentifierRole::Table)?;
        validate_identifier(field, IdentifierRole::Field)?;

        let expected_value = Value::from_json(expected)
            .ok_or_else(|| GateError::validation("expected value must be a scalar or null"))?;

        let operator = match body.get(OPERATOR_KEY) {
            None => DEFAULT_OPERATOR.to_string(),
            Some(JsonValue::String(token)) => self.registry.canonical(token)?,
            Some(_) => return Err(GateError::validation("'operator' must be a string")),
        };

        let filter = match body.get(WHERE_KEY) {
            None => Vec::new(),
            Some(JsonValue::Object(map)) => Self::parse_filter(map)?,
            Some(_) => return Err(GateError::validation("'where' must be an object")),
        };

        Ok(Assumption {
            table: table.to_string(),
            field: field.to_string(),
            expected_value,
            operator,
            filter,
        })
    }

    fn single_field_path(body: &Map<String, JsonValue>) -> GateResult<(&str, &JsonValue)> {
        let mut candidates = body
            .iter()
            .filter(|(key, _)| key.as_str() != OPERATOR_KEY && key.as_str() != WHERE_KEY);

        match (candidates.next(), candidates.next()) {
            (Some((path, expected)), None) => Ok((path.as_str(), expected)),
            (None, _) => Err(GateError::validation("a 'table.field' path is required")),
            (Some(_), Some(_)) => Err(GateError::validation("only one field path allowed")),
        }
    }

    fn split_path(path: &str) -> GateResult<(&str, &str)> {
        match path.split_once('.') {
            Some((table, field))
                if !table.is_empty() && !field.is_empty() && !field.contains('.') =>
            {
                Ok((table, field))
            }
            _ => Err(GateError::validation(
                "field path must have the form 'table.field'",
            )),
        }
    }

    fn parse_filter(map: &Map<String, JsonValue>) -> GateResult<Vec<(String, Value)>> {
        map.iter()
            .map(|(key, raw)| {
                validate_identifier(key, IdentifierRole::FilterKey)?;
                let value = Value::from_json(raw).ok_or_else(|| {
                    GateError::validation(format!("filter value for '{key}' must be a scalar or null"))
                })?;
                Ok((key.clone(), value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(payload: JsonValue) -> GateResult<Assumption> {
        let registry = OperatorRegistry::with_defaults();
        AssumptionParser::new(&registry).parse(&payload)
    }

    fn message(err: GateError) -> String {
        assert_eq!(err.status_code(), 400, "expected a validation error: {err}");
        err.public_message()
    }

    #[test]
    fn test_parse_full_payload() {
        let assumption =
            parse(json!({"assumption": {"t.f": "v", "operator": "==", "where": {"id": "1"}}}))
                .unwrap();
        assert_eq!(
            assumption,
            Assumption {
                table: "t".to_string(),
                field: "f".to_string(),
                expected_value: Value::from("v"),
                operator: "==".to_string(),
                filter: vec![("id".to_string(), Value::from("1"))],
            }
        );
    }

    #[test]
    fn test_defaults_operator_and_filter() {
        let assumption = parse(json!({"assumption": {"oxorder.oxordernr": 42}})).unwrap();
        assert_eq!(assumption.operator, "==");
        assert!(assumption.filter.is_empty());
        assert_eq!(assumption.expected_value, Value::Int(42));
    }

    #[test]
    fn test_operator_is_canonicalized() {
        let assumption =
            parse(json!({"assumption": {"t.f": null, "operator": "is not null"}})).unwrap();
        assert_eq!(assumption.operator, "IS NOT NULL");
        assert_eq!(assumption.expected_value, Value::Null);
    }

    #[test]
    fn test_filter_preserves_payload_order() {
        let assumption = parse(json!({"assumption": {
            "t.f": 1,
            "where": {"zeta": 1, "alpha": "a", "mid": null}
        }}))
        .unwrap();
        let keys: Vec<&str> = assumption.filter.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(assumption.filter[2].1, Value::Null);
    }

    #[test]
    fn test_rejects_missing_or_non_object_assumption() {
        assert!(parse(json!({})).is_err());
        assert!(parse(json!({"assumption": "t.f"})).is_err());
        assert!(parse(json!([1, 2])).is_err());
    }

    #[test]
    fn test_rejects_multiple_field_paths() {
        let err = parse(json!({"assumption": {"t.f": 1, "t2.f2": 2}})).unwrap_err();
        assert_eq!(message(err), "only one field path allowed");
    }

    #[test]
    fn test_rejects_missing_field_path() {
        let err = parse(json!({"assumption": {"operator": "=="}})).unwrap_err();
        assert!(message(err).contains("required"));
    }

    #[test]
    fn test_rejects_malformed_paths() {
        for path in ["tf", "t.f.g", ".f", "t.", "."] {
            let err = parse(json!({"assumption": {path: 1}})).unwrap_err();
            assert!(message(err).contains("table.field"), "path {path:?}");
        }
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        assert!(parse(json!({"assumption": {"users;--.f": 1}})).is_err());
        assert!(parse(json!({"assumption": {"t.select": 1}})).is_err());
        assert!(parse(json!({"assumption": {"t.f": 1, "where": {"1=1": 1}}})).is_err());
        assert!(parse(json!({"assumption": {"t.f": 1, "where": {"DROP": 1}}})).is_err());
    }

    #[test]
    fn test_rejects_unknown_operator() {
        let err = parse(json!({"assumption": {"t.f": 1, "operator": "<>"}})).unwrap_err();
        assert!(message(err).contains("allowed operators"));

        let err = parse(json!({"assumption": {"t.f": 1, "operator": 5}})).unwrap_err();
        assert!(message(err).contains("operator"));
    }

    #[test]
    fn test_rejects_non_object_where() {
        let err = parse(json!({"assumption": {"t.f": 1, "where": ["id", 1]}})).unwrap_err();
        assert!(message(err).contains("where"));
    }

    #[test]
    fn test_rejects_non_scalar_values_without_echo() {
        let err = parse(json!({"assumption": {"t.f": {"secret": "x"}}})).unwrap_err();
        assert!(!message(err).contains("secret"));

        let err =
            parse(json!({"assumption": {"t.f": 1, "where": {"id": ["secret"]}}})).unwrap_err();
        let msg = message(err);
        assert!(msg.contains("id"));
        assert!(!msg.contains("secret"));
    }
}
