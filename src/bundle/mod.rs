// Bundle identification and validation — compiled WebAssembly with a known
// export surface.

pub mod dispatch;

use std::fmt;

use wasmtime::{Engine, Module};

use crate::config::{CORE_BUNDLE_FILE, PLUGINS_BUNDLE_FILE};
use crate::error::LoadError;
use crate::source::traits::FetchedBundle;

/// Exports every bundle must provide for the host-call ABI.
const ABI_EXPORTS: [&str; 3] = ["memory", "alloc", "dealloc"];

/// The two independently hosted bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    Core,
    Plugins,
}

impl BundleKind {
    /// File name of this bundle under its base URL.
    pub fn bundle_file(self) -> &'static str {
        match self {
            BundleKind::Core => CORE_BUNDLE_FILE,
            BundleKind::Plugins => PLUGINS_BUNDLE_FILE,
        }
    }

    /// The recognizable export that identifies this bundle.
    pub fn marker_export(self) -> &'static str {
        match self {
            BundleKind::Core => "DataPrismEngine",
            BundleKind::Plugins => "PluginManager",
        }
    }

    /// The single dispatch entry point of this bundle.
    pub fn entry_export(self) -> &'static str {
        match self {
            BundleKind::Core => "dataprism_call",
            BundleKind::Plugins => "plugin_call",
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleKind::Core => write!(f, "core"),
            BundleKind::Plugins => write!(f, "plugins"),
        }
    }
}

/// Compile fetched bytes and verify the bundle's export surface.
///
/// Accepts binary wasm or WAT text (wasmtime's default behavior). A module
/// that compiles but lacks the marker or ABI exports is rejected the same
/// way syntactically invalid content is: as a per-resource load failure.
pub fn validate(engine: &Engine, fetched: &FetchedBundle) -> Result<Module, LoadError> {
    let module =
        Module::new(engine, fetched.bytes.as_ref()).map_err(|e| LoadError::InvalidBundle {
            url: fetched.url.clone(),
            reason: e.to_string(),
        })?;

    let exports: Vec<&str> = module.exports().map(|e| e.name()).collect();
    let mut required: Vec<&str> = vec![
        fetched.kind.marker_export(),
        fetched.kind.entry_export(),
    ];
    required.extend(ABI_EXPORTS);

    for name in required {
        if !exports.contains(&name) {
            return Err(LoadError::MissingExport {
                url: fetched.url.clone(),
                export: name.to_string(),
            });
        }
    }

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn fetched(kind: BundleKind, wat: &str) -> FetchedBundle {
        FetchedBundle {
            kind,
            url: format!("mem://{}", kind),
            bytes: Bytes::from(wat.as_bytes().to_vec()),
        }
    }

    #[test]
    fn test_validate_accepts_complete_core_bundle() {
        let wat = r#"(module
            (memory (export "memory") 1)
            (func (export "alloc") (param i32) (result i32) i32.const 0)
            (func (export "dealloc") (param i32 i32))
            (func (export "dataprism_call") (param i32 i32) (result i32) i32.const 0)
            (func (export "DataPrismEngine"))
        )"#;
        let engine = Engine::default();
        assert!(validate(&engine, &fetched(BundleKind::Core, wat)).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_marker() {
        let wat = r#"(module
            (memory (export "memory") 1)
            (func (export "alloc") (param i32) (result i32) i32.const 0)
            (func (export "dealloc") (param i32 i32))
            (func (export "dataprism_call") (param i32 i32) (result i32) i32.const 0)
        )"#;
        let engine = Engine::default();
        let err = validate(&engine, &fetched(BundleKind::Core, wat)).unwrap_err();
        assert!(matches!(err, LoadError::MissingExport { export, .. } if export == "DataPrismEngine"));
    }

    #[test]
    fn test_validate_rejects_garbage_bytes() {
        let engine = Engine::default();
        let bundle = FetchedBundle {
            kind: BundleKind::Plugins,
            url: "mem://plugins".into(),
            bytes: Bytes::from_static(b"<html>404 not found</html>"),
        };
        assert!(matches!(
            validate(&engine, &bundle),
            Err(LoadError::InvalidBundle { .. })
        ));
    }
}
