// SPDX-License-Identifier: Apache-2.0

//! Suspicious-value annotation
//!
//! Collects the raw string values of an assumption (the expected value and
//! every filter value) and reports which injection fingerprints they carry.
//! The result only decorates audit entries.

use serde_json::Value as JsonValue;

use gate_core::{Assumption, Value};
use gate_sql::detect_suspicious_in;

/// Fingerprints found in a parsed assumption's string values
pub fn scan_assumption(assumption: &Assumption) -> Vec<String> {
    let values = std::iter::once(&assumption.expected_value)
        .chain(assumption.filter.iter().map(|(_, value)| value))
        .filter_map(Value::as_str);

    detect_suspicious_in(values)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Fingerprints found anywhere in a raw payload's string values.
///
/// Used when the payload failed validation, so there is no parsed
/// assumption to scan.
pub fn scan_payload(payload: &JsonValue) -> Vec<String> {
    let mut strings = Vec::new();
    collect_strings(payload, &mut strings);
    detect_suspicious_in(strings)
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn collect_strings<'a>(value: &'a JsonValue, out: &mut Vec<&'a str>) {
    match value {
        JsonValue::String(s) => out.push(s),
        JsonValue::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        JsonValue::Object(map) => map.iter().for_each(|(key, item)| {
            out.push(key);
            collect_strings(item, out);
        }),
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scans_expected_and_filter_values() {
        let assumption = Assumption {
            table: "oxorder".to_string(),
            field: "OXSTATE".to_string(),
            expected_value: Value::from("x' UNION SELECT 1 --"),
            operator: "==".to_string(),
            filter: vec![("OXID".to_string(), Value::from("1; DROP TABLE oxuser"))],
        };
        let found = scan_assumption(&assumption);
        assert!(found.contains(&"union_select".to_string()));
        assert!(found.contains(&"line_comment".to_string()));
        assert!(found.contains(&"stacked_statement".to_string()));
    }

    #[test]
    fn clean_assumption_has_no_findings() {
        let assumption = Assumption {
            table: "t".to_string(),
            field: "f".to_string(),
            expected_value: Value::Int(3),
            operator: "==".to_string(),
            filter: vec![("id".to_string(), Value::from("c-1"))],
        };
        assert!(scan_assumption(&assumption).is_empty());
    }

    #[test]
    fn payload_scan_includes_keys() {
        let payload = json!({"assumption": {"t.f UNION SELECT x": "v"}});
        assert_eq!(scan_payload(&payload), vec!["union_select".to_string()]);
    }
}
