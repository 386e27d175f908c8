// SPDX-License-Identifier: Apache-2.0

//! SQL dialects supported by the row stores

use serde::{Deserialize, Serialize};

/// SQL dialect for different row stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlDialect {
    MySql,
    Sqlite,
}

impl SqlDialect {
    /// Quote an identifier according to the dialect
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            SqlDialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            SqlDialect::MySql => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// Positional placeholder for a bound parameter
    pub fn placeholder(&self) -> &'static str {
        match self {
            SqlDialect::MySql | SqlDialect::Sqlite => "?",
        }
    }
}
