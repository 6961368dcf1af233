use std::sync::Arc;

use bytes::Bytes;
use wasmtime::Module;

use crate::bundle::BundleKind;
use crate::engine::fallback::FallbackEngine;
use crate::engine::wasm::WasmEngine;
use crate::engine::AnalyticsEngine;
use crate::error::{EngineError, PluginError};
use crate::plugins::fallback::FallbackPluginManager;
use crate::plugins::wasm::WasmPluginManager;
use crate::plugins::PluginManager;

/// Where a sub-resource actually came from.
///
/// Callers must not infer degraded mode from object shape; this tag is the
/// signal that a CDN outage was masked by the embedded fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Remote,
    Fallback,
}

/// The fetched, validated bytes of a remote bundle.
#[derive(Debug, Clone)]
pub struct BundleArtifact {
    pub kind: BundleKind,
    pub url: String,
    pub bytes: Bytes,
}

impl BundleArtifact {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// The analytics core: either a validated remote bundle or the embedded
/// fallback. `engine()` constructs a fresh engine handle either way.
pub struct CoreModule {
    provenance: Provenance,
    artifact: Option<BundleArtifact>,
    module: Option<Module>,
}

impl CoreModule {
    pub(crate) fn remote(artifact: BundleArtifact, module: Module) -> Self {
        Self {
            provenance: Provenance::Remote,
            artifact: Some(artifact),
            module: Some(module),
        }
    }

    pub(crate) fn fallback() -> Self {
        Self {
            provenance: Provenance::Fallback,
            artifact: None,
            module: None,
        }
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn artifact(&self) -> Option<&BundleArtifact> {
        self.artifact.as_ref()
    }

    /// Construct an engine. Each call yields an independent instance with
    /// its own state, mirroring `new DataPrismEngine()` on the real bundle.
    pub fn engine(&self) -> Result<Arc<dyn AnalyticsEngine>, EngineError> {
        match &self.module {
            Some(module) => Ok(Arc::new(WasmEngine::instantiate(module)?)),
            None => Ok(Arc::new(FallbackEngine::new())),
        }
    }
}

/// The plugins bundle counterpart of [`CoreModule`].
pub struct PluginModule {
    provenance: Provenance,
    artifact: Option<BundleArtifact>,
    module: Option<Module>,
}

impl PluginModule {
    pub(crate) fn remote(artifact: BundleArtifact, module: Module) -> Self {
        Self {
            provenance: Provenance::Remote,
            artifact: Some(artifact),
            module: Some(module),
        }
    }

    pub(crate) fn fallback() -> Self {
        Self {
            provenance: Provenance::Fallback,
            artifact: None,
            module: None,
        }
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn artifact(&self) -> Option<&BundleArtifact> {
        self.artifact.as_ref()
    }

    pub fn manager(&self) -> Result<Arc<dyn PluginManager>, PluginError> {
        match &self.module {
            Some(module) => Ok(Arc::new(WasmPluginManager::instantiate(module)?)),
            None => Ok(Arc::new(FallbackPluginManager::new())),
        }
    }
}

/// The result of one successful load cycle, shared by all callers as a
/// single `Arc` until `reset()`.
pub struct LoadedDependencies {
    pub core: CoreModule,
    pub plugins: PluginModule,
}

impl LoadedDependencies {
    /// True when any sub-resource is running on the embedded fallback.
    pub fn is_degraded(&self) -> bool {
        self.core.provenance() == Provenance::Fallback
            || self.plugins.provenance() == Provenance::Fallback
    }
}
