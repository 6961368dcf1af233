// Embedded fallback engine — keeps demos alive when the CDN is unreachable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use super::table_store::TableStore;
use super::{AnalyticsEngine, EngineMetrics, LoadSummary, QueryResult, Row, TableInfo};
use crate::config::FALLBACK_INIT_DELAY_MS;
use crate::error::EngineError;

/// In-memory substitute for the remote analytics engine.
///
/// Each construction gets its own table store, matching the behavior of
/// instantiating a fresh engine from the real bundle.
pub struct FallbackEngine {
    store: TableStore,
    queries_executed: AtomicU64,
    rows_loaded: AtomicU64,
}

impl FallbackEngine {
    pub fn new() -> Self {
        Self {
            store: TableStore::new(),
            queries_executed: AtomicU64::new(0),
            rows_loaded: AtomicU64::new(0),
        }
    }
}

impl Default for FallbackEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyticsEngine for FallbackEngine {
    async fn initialize(&self) -> Result<(), EngineError> {
        // Simulated startup latency so callers exercise the same await
        // points they would against the real engine.
        tokio::time::sleep(Duration::from_millis(FALLBACK_INIT_DELAY_MS)).await;
        debug!("fallback engine initialized");
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult, EngineError> {
        let t0 = Instant::now();
        let rows = self.store.query(sql);
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        Ok(QueryResult {
            row_count: rows.len(),
            rows,
            execution_time_ms: t0.elapsed().as_millis() as u64,
        })
    }

    async fn load_data(&self, rows: Vec<Row>, table: &str) -> Result<LoadSummary, EngineError> {
        let count = self.store.load(table, rows)?;
        self.rows_loaded.fetch_add(count as u64, Ordering::Relaxed);
        debug!("fallback engine loaded {} rows into `{}`", count, table);
        Ok(LoadSummary {
            table: table.to_string(),
            rows_loaded: count,
        })
    }

    async fn get_table_info(&self, table: &str) -> Result<TableInfo, EngineError> {
        self.store.table_info(table)
    }

    async fn list_tables(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.store.table_names())
    }

    async fn get_metrics(&self) -> Result<EngineMetrics, EngineError> {
        Ok(EngineMetrics {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            rows_loaded: self.rows_loaded.load(Ordering::Relaxed),
            tables: self.store.table_count(),
        })
    }
}
