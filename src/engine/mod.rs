// Analytics engine surface — one trait, a remote implementation dispatching
// into the core bundle, and an embedded in-memory fallback.

pub mod fallback;
pub mod table_store;
pub mod wasm;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A single data row. Keys are column names.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Column type as reported by `get_table_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Boolean,
    Integer,
    Double,
    Timestamp,
    Varchar,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "INTEGER",
            ColumnType::Double => "DOUBLE",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Varchar => "VARCHAR",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    pub table: String,
    pub rows_loaded: usize,
}

/// Counters exposed by `get_metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub queries_executed: u64,
    pub rows_loaded: u64,
    pub tables: usize,
}

/// The engine API both the remote bundle and the fallback expose.
#[async_trait]
pub trait AnalyticsEngine: Send + Sync {
    async fn initialize(&self) -> Result<(), EngineError>;
    async fn query(&self, sql: &str) -> Result<QueryResult, EngineError>;
    async fn load_data(&self, rows: Vec<Row>, table: &str) -> Result<LoadSummary, EngineError>;
    async fn get_table_info(&self, table: &str) -> Result<TableInfo, EngineError>;
    async fn list_tables(&self) -> Result<Vec<String>, EngineError>;
    async fn get_metrics(&self) -> Result<EngineMetrics, EngineError>;
}
