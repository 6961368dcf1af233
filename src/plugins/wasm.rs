// Remote plugin-manager handle — drives a validated plugins bundle through
// the JSON dispatch ABI.

use async_trait::async_trait;
use serde_json::{json, Value};
use wasmtime::Module;

use super::PluginManager;
use crate::bundle::dispatch::{DispatchError, WasmDispatcher};
use crate::bundle::BundleKind;
use crate::error::PluginError;

pub struct WasmPluginManager {
    dispatcher: WasmDispatcher,
}

impl WasmPluginManager {
    pub fn instantiate(module: &Module) -> Result<Self, PluginError> {
        let dispatcher =
            WasmDispatcher::instantiate(module, BundleKind::Plugins.entry_export())
                .map_err(map_dispatch_error)?;
        Ok(Self { dispatcher })
    }
}

fn map_dispatch_error(err: DispatchError) -> PluginError {
    match err {
        DispatchError::MissingExport(name) => PluginError::Instantiation(format!(
            "plugins bundle is missing export `{}`",
            name
        )),
        DispatchError::Instantiation(msg) => PluginError::Instantiation(msg),
        DispatchError::Execution(msg) => PluginError::Execution(msg),
        DispatchError::Malformed(msg) => PluginError::Malformed(msg),
        DispatchError::Guest(msg) => PluginError::Remote(msg),
    }
}

#[async_trait]
impl PluginManager for WasmPluginManager {
    async fn list_plugins(&self) -> Result<Vec<String>, PluginError> {
        let response = self
            .dispatcher
            .call(&json!({"op": "list_plugins"}))
            .map_err(map_dispatch_error)?;
        let names = response
            .get("plugins")
            .and_then(Value::as_array)
            .ok_or_else(|| PluginError::Malformed("missing `plugins` array".to_string()))?;
        names
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| PluginError::Malformed("non-string plugin name".to_string()))
            })
            .collect()
    }

    async fn invoke(&self, plugin: &str, input: Value) -> Result<Value, PluginError> {
        self.dispatcher
            .call(&json!({"op": "invoke", "plugin": plugin, "input": input}))
            .map_err(map_dispatch_error)
    }
}
