//! Suspicious-pattern detection
//!
//! Raw string values (the expected value and filter values) are bound as
//! parameters and can never change the shape of a lookup. They are still
//! scanned for the usual injection fingerprints so the audit trail shows who
//! is probing. Matches are a signal only and never block a request.

use std::sync::OnceLock;

use regex::Regex;

struct SuspiciousPattern {
    name: &'static str,
    regex: Regex,
}

fn patterns() -> &'static [SuspiciousPattern] {
    static PATTERNS: OnceLock<Vec<SuspiciousPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            ("line_comment", r"--|#"),
            ("block_comment", r"/\*|\*/"),
            ("union_select", r"(?i)\bunion\b(\s+all)?\s+select\b"),
            ("stacked_statement", r"(?i);\s*(select|insert|update|delete|drop|create|alter|truncate)\b"),
            ("tautology", r#"(?i)['"\s]or\s+['"]?\w+['"]?\s*=\s*['"]?\w+"#),
            ("time_delay", r"(?i)\b(sleep|benchmark|pg_sleep|waitfor\s+delay)\b"),
            ("schema_probe", r"(?i)\binformation_schema\b"),
        ]
        .into_iter()
        .map(|(name, pattern)| SuspiciousPattern {
            name,
            regex: Regex::new(pattern).expect("suspicious pattern is valid"),
        })
        .collect()
    })
}

/// Returns the names of every suspicious pattern found in `value`.
pub fn detect_suspicious(value: &str) -> Vec<&'static str> {
    patterns()
        .iter()
        .filter(|pattern| pattern.regex.is_match(value))
        .map(|pattern| pattern.name)
        .collect()
}

/// Scans several values and returns the de-duplicated pattern names.
pub fn detect_suspicious_in<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<&'static str> {
    let mut found: Vec<&'static str> = Vec::new();
    for value in values {
        for name in detect_suspicious(value) {
            if !found.contains(&name) {
                found.push(name);
            }
        }
    }
    found
}
