// SPDX-License-Identifier: Apache-2.0

//! Identifier whitelisting
//!
//! Table names, field names and filter keys all come straight from the
//! request body. Before any of them is handed to a row store they must look
//! like a plain SQL identifier and must not be a statement keyword.

use std::fmt;
use std::sync::OnceLock;

use gate_core::{GateError, GateResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// MySQL rejects identifiers longer than this.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Keywords that are never accepted as identifiers, compared case-insensitively.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "SELECT",
    "INSERT",
    "UPDATE",
    "DELETE",
    "DROP",
    "CREATE",
    "ALTER",
    "TRUNCATE",
    "UNION",
    "JOIN",
    "WHERE",
    "FROM",
    "TABLE",
    "DATABASE",
    "EXEC",
    "EXECUTE",
    "DECLARE",
    "CAST",
    "CONVERT",
    "SCRIPT",
    "JAVASCRIPT",
    "EVAL",
    "EXPRESSION",
    "COMPILE",
];

/// Where an identifier appears in the assumption; only used in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierRole {
    Table,
    Field,
    FilterKey,
}

impl IdentifierRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Field => "field",
            Self::FilterKey => "filter key",
        }
    }
}

impl fmt::Display for IdentifierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// Returns true if `identifier` is one of [`RESERVED_KEYWORDS`].
pub fn is_reserved_keyword(identifier: &str) -> bool {
    RESERVED_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(identifier))
}

/// Validates a user-supplied identifier.
///
/// The rejected identifier is never echoed unless it is a reserved keyword,
/// since anything else may carry arbitrary payload text.
pub fn validate_identifier(identifier: &str, role: IdentifierRole) -> GateResult<()> {
    if identifier.is_empty() {
        return Err(GateError::validation(format!(
            "Invalid {role} identifier: must not be empty"
        )));
    }

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(GateError::validation(format!(
            "Invalid {role} identifier: longer than {MAX_IDENTIFIER_LEN} characters"
        )));
    }

    if !identifier_pattern().is_match(identifier) {
        return Err(GateError::validation(format!(
            "Invalid {role} identifier: only letters, digits and underscores are allowed, \
             and it must not start with a digit"
        )));
    }

    if is_reserved_keyword(identifier) {
        return Err(GateError::validation(format!(
            "Invalid {role} identifier: '{identifier}' is a reserved keyword"
        )));
    }

    Ok(())
}
