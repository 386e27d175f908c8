// SPDX-License-Identifier: Apache-2.0

//! Single-row lookup builder
//!
//! Renders `SELECT <field> FROM <table> WHERE <k> = ? AND ... LIMIT 1`.
//! Identifiers only ever reach the SQL text through [`SqlDialect::quote_ident`]
//! and filter values only ever travel as bound parameters.

use gate_core::{Assumption, Value};
use serde::{Deserialize, Serialize};

use crate::dialect::SqlDialect;

/// A read-only lookup of one field from at most one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupQuery {
    pub table: String,
    pub field: String,
    pub filter: Vec<(String, Value)>,
}

/// SQL text plus the parameters to bind, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLookup {
    pub sql: String,
    pub params: Vec<Value>,
}

impl LookupQuery {
    pub fn new(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            field: field.into(),
            filter: Vec::new(),
        }
    }

    /// Adds an equality predicate.
    pub fn with_filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filter.push((key.into(), value));
        self
    }

    pub fn for_assumption(assumption: &Assumption) -> Self {
        Self {
            table: assumption.table.clone(),
            field: assumption.field.clone(),
            filter: assumption.filter.clone(),
        }
    }

    /// Renders the lookup for `dialect`.
    ///
    /// A `null` filter value renders as `IS NULL` (a bound `= NULL` would
    /// never match); it carries no parameter.
    pub fn render(&self, dialect: SqlDialect) -> RenderedLookup {
        let mut sql = format!(
            "SELECT {} FROM {}",
            dialect.quote_ident(&self.field),
            dialect.quote_ident(&self.table)
        );
        let mut params = Vec::with_capacity(self.filter.len());

        for (idx, (key, value)) in self.filter.iter().enumerate() {
            sql.push_str(if idx == 0 { " WHERE " } else { " AND " });
            sql.push_str(&dialect.quote_ident(key));
            if value.is_null() {
                sql.push_str(" IS NULL");
            } else {
                sql.push_str(" = ");
                sql.push_str(dialect.placeholder());
                params.push(value.clone());
            }
        }

        sql.push_str(" LIMIT 1");
        RenderedLookup { sql, params }
    }
}
