// In-memory table store backing the fallback engine.
//
// Deliberately not a SQL engine: the only recognized query shape is a
// case-insensitive `SELECT <anything> FROM <identifier>`, which is enough to
// keep a demo alive while the real engine is unreachable.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;

use crate::config::FALLBACK_QUERY_ROW_LIMIT;
use crate::engine::{ColumnInfo, ColumnType, Row, TableInfo};
use crate::error::EngineError;

static SELECT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bSELECT\b.+?\bFROM\s+([A-Za-z_][A-Za-z0-9_]*)").expect("static regex")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));

/// Table name → rows in insertion order of the loaded batch.
pub struct TableStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl TableStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Store a batch under `table`, replacing any previous batch.
    pub fn load(&self, table: &str, rows: Vec<Row>) -> Result<usize, EngineError> {
        if rows.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        if !IDENTIFIER.is_match(table) {
            return Err(EngineError::InvalidTableName(table.to_string()));
        }
        let count = rows.len();
        self.tables.write().insert(table.to_string(), rows);
        Ok(count)
    }

    /// Evaluate `sql` against the store.
    ///
    /// Unrecognized SQL text and unknown tables both yield an empty result
    /// set; a known table yields up to [`FALLBACK_QUERY_ROW_LIMIT`] rows.
    pub fn query(&self, sql: &str) -> Vec<Row> {
        let table = match SELECT_FROM.captures(sql).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().to_string(),
            None => return Vec::new(),
        };

        let tables = self.tables.read();
        match tables.get(&table) {
            Some(rows) => rows.iter().take(FALLBACK_QUERY_ROW_LIMIT).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Schema snapshot derived from the first row of the batch.
    pub fn table_info(&self, table: &str) -> Result<TableInfo, EngineError> {
        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .ok_or_else(|| EngineError::TableNotFound(table.to_string()))?;

        let columns = rows
            .first()
            .map(|row| {
                row.iter()
                    .map(|(name, value)| ColumnInfo {
                        name: name.clone(),
                        column_type: infer_column_type(value),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(TableInfo {
            name: table.to_string(),
            row_count: rows.len(),
            columns,
        })
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer a display type from a single value. Mixed-type columns report
/// whatever the first row held; no later rows are consulted.
fn infer_column_type(value: &Value) -> ColumnType {
    match value {
        Value::Bool(_) => ColumnType::Boolean,
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                ColumnType::Integer
            } else {
                ColumnType::Double
            }
        }
        Value::String(s) if is_date_like(s) => ColumnType::Timestamp,
        _ => ColumnType::Varchar,
    }
}

fn is_date_like(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows_from(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_query_matches_select_from_case_insensitive() {
        let store = TableStore::new();
        store
            .load("sales", rows_from(vec![json!({"amount": 10})]))
            .unwrap();

        assert_eq!(store.query("select * from sales").len(), 1);
        assert_eq!(store.query("SELECT amount FROM sales LIMIT 5").len(), 1);
        assert_eq!(store.query("SELECT * FROM other").len(), 0);
        // Unrecognized shapes yield empty results, never errors.
        assert_eq!(store.query("INSERT INTO sales VALUES (1)").len(), 0);
        assert_eq!(store.query("not sql at all").len(), 0);
    }

    #[test]
    fn test_query_preserves_insertion_order_and_caps_rows() {
        let store = TableStore::new();
        let rows: Vec<Row> = (0..150)
            .map(|i| rows_from(vec![json!({"n": i})]).pop().unwrap())
            .collect();
        store.load("big", rows).unwrap();

        let out = store.query("SELECT * FROM big");
        assert_eq!(out.len(), FALLBACK_QUERY_ROW_LIMIT);
        assert_eq!(out[0]["n"], json!(0));
        assert_eq!(out[99]["n"], json!(99));
    }

    #[test]
    fn test_load_rejects_empty_and_bad_names() {
        let store = TableStore::new();
        assert!(matches!(
            store.load("t", Vec::new()),
            Err(EngineError::EmptyBatch)
        ));
        assert!(matches!(
            store.load("1bad name", rows_from(vec![json!({"a": 1})])),
            Err(EngineError::InvalidTableName(_))
        ));
    }

    #[test]
    fn test_type_inference_from_first_row_only() {
        let store = TableStore::new();
        store
            .load(
                "typed",
                rows_from(vec![
                    json!({
                        "flag": true,
                        "count": 3,
                        "ratio": 0.5,
                        "when": "2024-01-15",
                        "label": "abc"
                    }),
                    // Mixed types below the first row are ignored.
                    json!({
                        "flag": "yes",
                        "count": "many",
                        "ratio": 1,
                        "when": 7,
                        "label": false
                    }),
                ]),
            )
            .unwrap();

        let info = store.table_info("typed").unwrap();
        assert_eq!(info.row_count, 2);
        let by_name: std::collections::HashMap<_, _> = info
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.column_type))
            .collect();
        assert_eq!(by_name["flag"], ColumnType::Boolean);
        assert_eq!(by_name["count"], ColumnType::Integer);
        assert_eq!(by_name["ratio"], ColumnType::Double);
        assert_eq!(by_name["when"], ColumnType::Timestamp);
        assert_eq!(by_name["label"], ColumnType::Varchar);
    }

    #[test]
    fn test_table_info_unknown_table() {
        let store = TableStore::new();
        assert!(matches!(
            store.table_info("missing"),
            Err(EngineError::TableNotFound(name)) if name == "missing"
        ));
    }
}
