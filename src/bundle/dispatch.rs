// JSON-over-linear-memory dispatch into a validated bundle.
//
// Host side of the ABI: write the UTF-8 JSON request into guest memory via
// `alloc`, call the entry function `(ptr, len) -> i32`, read the 8-byte
// little-endian `[out_ptr, out_len]` header it returns, read the response
// JSON, then `dealloc` everything.

use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use wasmtime::{Linker, Memory, Module, Store, TypedFunc};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("bundle is missing export `{0}`")]
    MissingExport(String),
    #[error("bundle instantiation failed: {0}")]
    Instantiation(String),
    #[error("bundle call trapped: {0}")]
    Execution(String),
    #[error("bundle returned malformed data: {0}")]
    Malformed(String),
    #[error("{0}")]
    Guest(String),
}

struct DispatcherInner {
    store: Store<()>,
    memory: Memory,
    alloc: TypedFunc<i32, i32>,
    dealloc: TypedFunc<(i32, i32), ()>,
    entry: TypedFunc<(i32, i32), i32>,
}

/// A live instance of a bundle with its dispatch entry point resolved.
///
/// One instance per handle, so guest state (loaded tables and the like)
/// persists across calls. Calls are serialized; the store is never shared.
pub struct WasmDispatcher {
    inner: Mutex<DispatcherInner>,
}

impl WasmDispatcher {
    /// Instantiate `module` and resolve the ABI exports.
    ///
    /// Bundles import nothing from the host; an empty linker is enough.
    pub fn instantiate(module: &Module, entry_name: &str) -> Result<Self, DispatchError> {
        let engine = module.engine();
        let mut store = Store::new(engine, ());
        let linker: Linker<()> = Linker::new(engine);
        let instance = linker
            .instantiate(&mut store, module)
            .map_err(|e| DispatchError::Instantiation(e.to_string()))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| DispatchError::MissingExport("memory".to_string()))?;
        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, "alloc")
            .map_err(|_| DispatchError::MissingExport("alloc".to_string()))?;
        let dealloc = instance
            .get_typed_func::<(i32, i32), ()>(&mut store, "dealloc")
            .map_err(|_| DispatchError::MissingExport("dealloc".to_string()))?;
        let entry = instance
            .get_typed_func::<(i32, i32), i32>(&mut store, entry_name)
            .map_err(|_| DispatchError::MissingExport(entry_name.to_string()))?;

        Ok(Self {
            inner: Mutex::new(DispatcherInner {
                store,
                memory,
                alloc,
                dealloc,
                entry,
            }),
        })
    }

    /// Round-trip one JSON request through the bundle.
    pub fn call(&self, request: &Value) -> Result<Value, DispatchError> {
        let input = serde_json::to_vec(request)
            .map_err(|e| DispatchError::Malformed(e.to_string()))?;

        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        let input_len = input.len() as i32;
        let input_ptr = inner
            .alloc
            .call(&mut inner.store, input_len)
            .map_err(|e| DispatchError::Execution(e.to_string()))?;
        inner
            .memory
            .write(&mut inner.store, input_ptr as usize, &input)
            .map_err(|e| DispatchError::Execution(e.to_string()))?;

        let header_ptr = inner
            .entry
            .call(&mut inner.store, (input_ptr, input_len))
            .map_err(|e| DispatchError::Execution(e.to_string()))?;

        let mut header = [0u8; 8];
        inner
            .memory
            .read(&inner.store, header_ptr as usize, &mut header)
            .map_err(|e| DispatchError::Execution(e.to_string()))?;
        let out_ptr = i32::from_le_bytes(header[0..4].try_into().unwrap());
        let out_len = i32::from_le_bytes(header[4..8].try_into().unwrap());

        // The header fields come from guest code; bounds-check them before
        // allocating anything based on their values.
        let data_size = inner.memory.data_size(&inner.store);
        if out_ptr < 0
            || out_len < 0
            || (out_ptr as usize).saturating_add(out_len as usize) > data_size
        {
            return Err(DispatchError::Malformed(format!(
                "response header points outside guest memory (ptr={}, len={})",
                out_ptr, out_len
            )));
        }
        let out_ptr = out_ptr as usize;
        let out_len = out_len as usize;

        let mut out_bytes = vec![0u8; out_len];
        inner
            .memory
            .read(&inner.store, out_ptr, &mut out_bytes)
            .map_err(|e| DispatchError::Execution(e.to_string()))?;

        let _ = inner
            .dealloc
            .call(&mut inner.store, (input_ptr, input_len));
        let _ = inner
            .dealloc
            .call(&mut inner.store, (out_ptr as i32, out_len as i32));
        let _ = inner.dealloc.call(&mut inner.store, (header_ptr, 8));

        let response: Value = serde_json::from_slice(&out_bytes)
            .map_err(|e| DispatchError::Malformed(e.to_string()))?;

        // Guest-level failures travel in-band as `{"error": "..."}`.
        if let Some(msg) = response.get("error").and_then(Value::as_str) {
            return Err(DispatchError::Guest(msg.to_string()));
        }

        Ok(response)
    }
}
