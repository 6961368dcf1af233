// Embedded fallback plugin set — a CSV importer plus no-op stand-ins for
// the charting and monitoring plugins of the real bundle.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::csv_import::CsvImportPlugin;
use super::{Plugin, PluginManager};
use crate::error::PluginError;

/// Acknowledges chart-creation requests without rendering anything.
pub struct ChartCreateStub;

#[async_trait]
impl Plugin for ChartCreateStub {
    fn name(&self) -> &str {
        "chart-create"
    }

    fn description(&self) -> &str {
        "No-op chart creation stub"
    }

    async fn invoke(&self, input: Value) -> Result<Value, PluginError> {
        let chart_type = input
            .get("chart_type")
            .and_then(Value::as_str)
            .unwrap_or("bar");
        Ok(json!({
            "created": false,
            "chart_type": chart_type,
            "reason": "chart rendering is unavailable in fallback mode",
        }))
    }
}

/// Acknowledges monitoring requests without collecting anything.
pub struct PerformanceMonitorStub;

#[async_trait]
impl Plugin for PerformanceMonitorStub {
    fn name(&self) -> &str {
        "performance-monitor"
    }

    fn description(&self) -> &str {
        "No-op performance monitoring stub"
    }

    async fn invoke(&self, _input: Value) -> Result<Value, PluginError> {
        Ok(json!({
            "monitoring": false,
            "reason": "performance monitoring is unavailable in fallback mode",
        }))
    }
}

/// Name-keyed registry pre-populated with the three fallback plugins.
pub struct FallbackPluginManager {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl FallbackPluginManager {
    pub fn new() -> Self {
        let mut plugins: HashMap<String, Arc<dyn Plugin>> = HashMap::new();
        for plugin in [
            Arc::new(CsvImportPlugin::new()) as Arc<dyn Plugin>,
            Arc::new(ChartCreateStub),
            Arc::new(PerformanceMonitorStub),
        ] {
            plugins.insert(plugin.name().to_string(), plugin);
        }
        Self { plugins }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }
}

impl Default for FallbackPluginManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginManager for FallbackPluginManager {
    async fn list_plugins(&self) -> Result<Vec<String>, PluginError> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn invoke(&self, plugin: &str, input: Value) -> Result<Value, PluginError> {
        let plugin = self
            .get(plugin)
            .ok_or_else(|| PluginError::NotFound(plugin.to_string()))?;
        debug!("fallback plugin `{}` invoked", plugin.name());
        plugin.invoke(input).await
    }
}
