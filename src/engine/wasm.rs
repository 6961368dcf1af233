// Remote engine handle — drives a validated core bundle through the
// JSON dispatch ABI.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use wasmtime::Module;

use super::{AnalyticsEngine, EngineMetrics, LoadSummary, QueryResult, Row, TableInfo};
use crate::bundle::dispatch::{DispatchError, WasmDispatcher};
use crate::bundle::BundleKind;
use crate::error::EngineError;

/// Engine constructed from a remote core bundle.
pub struct WasmEngine {
    dispatcher: WasmDispatcher,
}

impl WasmEngine {
    pub fn instantiate(module: &Module) -> Result<Self, EngineError> {
        let dispatcher =
            WasmDispatcher::instantiate(module, BundleKind::Core.entry_export())
                .map_err(map_dispatch_error)?;
        Ok(Self { dispatcher })
    }

    fn call_decoded<T: DeserializeOwned>(&self, request: Value) -> Result<T, EngineError> {
        let response = self.dispatcher.call(&request).map_err(map_dispatch_error)?;
        serde_json::from_value(response).map_err(|e| EngineError::Malformed(e.to_string()))
    }
}

fn map_dispatch_error(err: DispatchError) -> EngineError {
    match err {
        DispatchError::MissingExport(name) => EngineError::MissingExport(name),
        DispatchError::Instantiation(msg) => EngineError::Instantiation(msg),
        DispatchError::Execution(msg) => EngineError::Execution(msg),
        DispatchError::Malformed(msg) => EngineError::Malformed(msg),
        DispatchError::Guest(msg) => EngineError::Remote(msg),
    }
}

#[async_trait]
impl AnalyticsEngine for WasmEngine {
    async fn initialize(&self) -> Result<(), EngineError> {
        // Any non-error response counts as a successful init.
        self.dispatcher
            .call(&json!({"op": "initialize"}))
            .map_err(map_dispatch_error)?;
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult, EngineError> {
        self.call_decoded(json!({"op": "query", "sql": sql}))
    }

    async fn load_data(&self, rows: Vec<Row>, table: &str) -> Result<LoadSummary, EngineError> {
        if rows.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        self.call_decoded(json!({"op": "load_data", "table": table, "rows": rows}))
    }

    async fn get_table_info(&self, table: &str) -> Result<TableInfo, EngineError> {
        self.call_decoded(json!({"op": "get_table_info", "table": table}))
    }

    async fn list_tables(&self) -> Result<Vec<String>, EngineError> {
        #[derive(serde::Deserialize)]
        struct Tables {
            tables: Vec<String>,
        }
        let out: Tables = self.call_decoded(json!({"op": "list_tables"}))?;
        Ok(out.tables)
    }

    async fn get_metrics(&self) -> Result<EngineMetrics, EngineError> {
        self.call_decoded(json!({"op": "get_metrics"}))
    }
}
