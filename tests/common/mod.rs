#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use assumption_gate_lib::auth::{AllowListEntry, AuthGate};
use assumption_gate_lib::engine::{RowStore, SqliteRowStore};
use assumption_gate_lib::interceptor::AuditRecorder;
use assumption_gate_lib::AppState;
use gate_core::{GateResult, Row};
use gate_query::{LookupQuery, SqlDialect};

pub const CALLER: &str = "10.0.0.5";
pub const KEY: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";
pub const OTHER_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Row store wrapper that counts lookups
pub struct CountingStore {
    inner: SqliteRowStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RowStore for CountingStore {
    fn driver_id(&self) -> &'static str {
        self.inner.driver_id()
    }

    fn dialect(&self) -> SqlDialect {
        self.inner.dialect()
    }

    async fn fetch_one(&self, query: &LookupQuery) -> GateResult<Option<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_one(query).await
    }

    async fn ping(&self) -> GateResult<()> {
        self.inner.ping().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

pub async fn seeded_store() -> Arc<CountingStore> {
    let inner = SqliteRowStore::connect("sqlite::memory:", 1).await.unwrap();
    sqlx::query(
        "CREATE TABLE osc_payment_contract (OXID TEXT PRIMARY KEY, OXSTATE TEXT, OXAMOUNT REAL, OXNOTE TEXT)",
    )
    .execute(inner.pool())
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO osc_payment_contract VALUES \
         ('c-1', 'committed', 99.5, NULL), \
         ('c-2', 'pending', 10, 'Paid by Invoice')",
    )
    .execute(inner.pool())
    .await
    .unwrap();

    Arc::new(CountingStore {
        inner,
        calls: AtomicUsize::new(0),
    })
}

pub fn allow_list() -> AuthGate {
    AuthGate::new(vec![
        AllowListEntry::new(CALLER, KEY, "ci").unwrap(),
        AllowListEntry::new("192.168.1.0/24", OTHER_KEY, "lab").unwrap(),
    ])
}

pub fn app_state(store: Arc<CountingStore>, audit: Arc<AuditRecorder>, enabled: bool) -> AppState {
    AppState::new(enabled, allow_list(), store, audit, Duration::from_secs(2))
}
