use serde_json::{json, Value};

use dataprism_loader::plugins::fallback::FallbackPluginManager;
use dataprism_loader::{PluginError, PluginManager};

#[tokio::test]
async fn test_list_plugins_sorted() {
    let manager = FallbackPluginManager::new();
    let names = manager.list_plugins().await.unwrap();
    assert_eq!(
        names,
        vec!["chart-create", "csv-import", "performance-monitor"]
    );
}

#[tokio::test]
async fn test_unknown_plugin_not_found() {
    let manager = FallbackPluginManager::new();
    let err = manager.invoke("nope", json!({})).await.unwrap_err();
    assert!(matches!(err, PluginError::NotFound(name) if name == "nope"));
}

#[tokio::test]
async fn test_csv_import_basic() {
    let manager = FallbackPluginManager::new();
    let out = manager
        .invoke("csv-import", json!("a,b\n1,2\n3,4"))
        .await
        .unwrap();

    assert_eq!(out["columns"], json!(["a", "b"]));
    assert_eq!(out["row_count"], json!(2));
    assert_eq!(out["rows"], json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}]));
    assert_eq!(out["delimiter"], json!(","));
    assert_eq!(out["validation"]["ragged_rows"], json!(0));
    assert_eq!(out["validation"]["empty_cells"], json!(0));
    assert_eq!(out["validation"]["quality_score"], json!(1.0));
}

#[tokio::test]
async fn test_csv_import_accepts_text_object() {
    let manager = FallbackPluginManager::new();
    let out = manager
        .invoke("csv-import", json!({"text": "x;y\nhello;world"}))
        .await
        .unwrap();

    assert_eq!(out["delimiter"], json!(";"));
    assert_eq!(out["rows"], json!([{"x": "hello", "y": "world"}]));
}

#[tokio::test]
async fn test_csv_import_sniffs_tab_and_pipe() {
    let manager = FallbackPluginManager::new();

    let out = manager
        .invoke("csv-import", json!("a\tb\n1\t2"))
        .await
        .unwrap();
    assert_eq!(out["delimiter"], json!("\t"));

    let out = manager
        .invoke("csv-import", json!("a|b\ntrue|FALSE"))
        .await
        .unwrap();
    assert_eq!(out["delimiter"], json!("|"));
    assert_eq!(out["rows"], json!([{"a": true, "b": false}]));
}

#[tokio::test]
async fn test_csv_import_ragged_rows_lower_quality() {
    let manager = FallbackPluginManager::new();
    let out = manager
        .invoke("csv-import", json!("a,b\n1,2\n3\n5,6"))
        .await
        .unwrap();

    assert_eq!(out["row_count"], json!(3));
    assert_eq!(out["rows"][1], json!({"a": 3, "b": Value::Null}));
    assert_eq!(out["validation"]["ragged_rows"], json!(1));
    assert_eq!(out["validation"]["empty_cells"], json!(1));
    let score = out["validation"]["quality_score"].as_f64().unwrap();
    assert!(score < 1.0, "score was {}", score);
}

#[tokio::test]
async fn test_csv_import_rejects_bad_input() {
    let manager = FallbackPluginManager::new();

    let err = manager.invoke("csv-import", json!(42)).await.unwrap_err();
    assert!(matches!(err, PluginError::InvalidInput(_)));

    let err = manager
        .invoke("csv-import", json!({"rows": []}))
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::InvalidInput(_)));

    // Whitespace-only text has no header line.
    let err = manager
        .invoke("csv-import", json!("   \n  "))
        .await
        .unwrap_err();
    assert!(matches!(err, PluginError::InvalidInput(_)));
}

#[tokio::test]
async fn test_chart_create_stub_acknowledges() {
    let manager = FallbackPluginManager::new();
    let out = manager
        .invoke("chart-create", json!({"chart_type": "line"}))
        .await
        .unwrap();
    assert_eq!(out["created"], json!(false));
    assert_eq!(out["chart_type"], json!("line"));
    assert!(out["reason"].as_str().unwrap().contains("fallback"));
}

#[tokio::test]
async fn test_performance_monitor_stub_acknowledges() {
    let manager = FallbackPluginManager::new();
    let out = manager
        .invoke("performance-monitor", json!({}))
        .await
        .unwrap();
    assert_eq!(out["monitoring"], json!(false));
}
