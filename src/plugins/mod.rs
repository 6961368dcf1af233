// Plugin surface — one manager trait, a remote implementation over the
// plugins bundle, and the embedded fallback plugin set.

pub mod csv_import;
pub mod fallback;
pub mod wasm;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PluginError;

/// A single named plugin, invokable with a JSON payload.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn invoke(&self, input: Value) -> Result<Value, PluginError>;
}

/// The plugin-manager API both the remote bundle and the fallback expose.
#[async_trait]
pub trait PluginManager: Send + Sync {
    async fn list_plugins(&self) -> Result<Vec<String>, PluginError>;
    async fn invoke(&self, plugin: &str, input: Value) -> Result<Value, PluginError>;
}
