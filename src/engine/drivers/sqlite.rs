//! SQLite Driver
//!
//! Implements the RowStore trait for SQLite databases using SQLx.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row};

use gate_core::{GateError, GateResult, Row as GRow, Value};
use gate_query::{LookupQuery, SqlDialect};

use crate::engine::traits::RowStore;

/// SQLite row store backed by a connection pool
pub struct SqliteRowStore {
    pool: SqlitePool,
}

impl SqliteRowStore {
    /// Opens a pool against `url` (`sqlite://path/to.db` or `sqlite::memory:`).
    ///
    /// Every connection to `sqlite::memory:` sees its own database, so use a
    /// single connection there.
    pub async fn connect(url: &str, max_connections: u32) -> GateResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| GateError::internal(format!("SQLite connection failed: {e}")))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn bind_param<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        value: &'q Value,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.as_str()),
        }
    }

    fn convert_row(sqlite_row: &SqliteRow) -> GRow {
        let columns = sqlite_row
            .columns()
            .iter()
            .map(|col| {
                (
                    col.name().to_string(),
                    Self::extract_value(sqlite_row, col.ordinal()),
                )
            })
            .collect();

        GRow::new(columns)
    }

    /// Extracts a value from a SqliteRow at the given index
    ///
    /// SQLite has dynamic typing, so we try multiple types in order of likelihood
    fn extract_value(row: &SqliteRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map(Value::Int).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v.map(Value::Float).unwrap_or(Value::Null);
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.map(Value::Text).unwrap_or(Value::Null);
        }
        // BLOB
        if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return v
                .map(|b| Value::Text(String::from_utf8_lossy(&b).into_owned()))
                .unwrap_or(Value::Null);
        }

        Value::Null
    }
}

#[async_trait]
impl RowStore for SqliteRowStore {
    fn driver_id(&self) -> &'static str {
        "sqlite"
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    async fn fetch_one(&self, query: &LookupQuery) -> GateResult<Option<GRow>> {
        let rendered = query.render(self.dialect());

        let mut q = sqlx::query(&rendered.sql);
        for param in &rendered.params {
            q = Self::bind_param(q, param);
        }

        let row = q
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GateError::internal(e.to_string()))?;

        Ok(row.as_ref().map(Self::convert_row))
    }

    async fn ping(&self) -> GateResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| GateError::internal(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
