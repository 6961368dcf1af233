// CDN dependency loader — single-flight load cycles with retry/backoff,
// result caching, and per-resource fallback construction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dependencies::{BundleArtifact, CoreModule, LoadedDependencies, PluginModule};
use crate::bundle::{self, BundleKind};
use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::source::http_source::HttpBundleSource;
use crate::source::traits::BundleSource;

/// Observable lifecycle of a loader instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Loading,
    Cached,
    Failed,
}

struct RemoteBundle {
    artifact: BundleArtifact,
    module: wasmtime::Module,
}

/// Loads the core and plugins bundles, masking transient CDN failures.
///
/// Owned by the application's composition root and injected where needed;
/// there is deliberately no process-wide instance. At most one load cycle is
/// in flight per loader: concurrent callers attach to the same outcome and
/// receive the same `Arc`.
pub struct DependencyLoader {
    config: LoaderConfig,
    source: Arc<dyn BundleSource>,
    wasm_engine: wasmtime::Engine,
    state: RwLock<LoaderState>,
    // Latest successful result with the generation that produced it. Kept
    // even with caching disabled so callers queued behind an in-flight
    // cycle can share its outcome.
    latest: RwLock<Option<(u64, Arc<LoadedDependencies>)>>,
    generation: AtomicU64,
    load_lock: tokio::sync::Mutex<()>,
    cancel: RwLock<CancellationToken>,
}

impl DependencyLoader {
    pub fn new(config: LoaderConfig) -> Self {
        let source = Arc::new(HttpBundleSource::new(&config));
        Self::with_source(config, source)
    }

    /// Construct with an injected bundle source (the test seam).
    pub fn with_source(config: LoaderConfig, source: Arc<dyn BundleSource>) -> Self {
        Self {
            config,
            source,
            wasm_engine: wasmtime::Engine::default(),
            state: RwLock::new(LoaderState::Idle),
            latest: RwLock::new(None),
            generation: AtomicU64::new(0),
            load_lock: tokio::sync::Mutex::new(()),
            cancel: RwLock::new(CancellationToken::new()),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn state(&self) -> LoaderState {
        *self.state.read()
    }

    /// True iff a successful load is cached.
    pub fn is_loaded(&self) -> bool {
        self.config.enable_cache && self.latest.read().is_some()
    }

    /// Synchronous accessor for the cached result.
    pub fn get_dependencies(&self) -> Result<Arc<LoadedDependencies>, LoadError> {
        if !self.config.enable_cache {
            return Err(LoadError::NotLoaded);
        }
        self.latest
            .read()
            .as_ref()
            .map(|(_, deps)| Arc::clone(deps))
            .ok_or(LoadError::NotLoaded)
    }

    /// Discard the cached result and cancel any in-flight load cycle.
    ///
    /// References already handed out stay valid; the next
    /// `load_dependencies` call performs a fresh load.
    pub fn reset(&self) {
        {
            let mut cancel = self.cancel.write();
            cancel.cancel();
            *cancel = CancellationToken::new();
        }
        *self.latest.write() = None;
        *self.state.write() = LoaderState::Idle;
        info!("dependency loader reset");
    }

    /// Load both bundles, or return the shared result of a cached or
    /// in-flight load cycle.
    pub async fn load_dependencies(&self) -> Result<Arc<LoadedDependencies>, LoadError> {
        if self.config.enable_cache {
            if let Some((_, deps)) = self.latest.read().as_ref() {
                debug!("dependency cache hit");
                return Ok(Arc::clone(deps));
            }
        }

        // Snapshot before queueing on the lock so a cycle that completes
        // while we wait is recognizable as newer than this call.
        let seen_generation = self.generation.load(Ordering::Acquire);
        let _guard = self.load_lock.lock().await;

        if let Some((generation, deps)) = self.latest.read().as_ref() {
            if self.config.enable_cache || *generation > seen_generation {
                debug!("attached to result of concurrent load cycle");
                return Ok(Arc::clone(deps));
            }
        }

        *self.state.write() = LoaderState::Loading;
        let cancel = self.cancel.read().clone();

        match self.run_load_cycle(&cancel).await {
            Ok(deps) => {
                if cancel.is_cancelled() {
                    // reset() raced the tail of this cycle; drop the result.
                    return Err(LoadError::Cancelled);
                }
                let deps = Arc::new(deps);
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                *self.latest.write() = Some((generation, Arc::clone(&deps)));
                *self.state.write() = LoaderState::Cached;
                Ok(deps)
            }
            Err(e) => {
                // A cycle cancelled by reset() must not clobber the Idle
                // state reset() just wrote.
                if !matches!(e, LoadError::Cancelled) {
                    *self.state.write() = LoaderState::Failed;
                }
                Err(e)
            }
        }
    }

    async fn run_load_cycle(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LoadedDependencies, LoadError> {
        let attempts = self.config.retries.max(1);
        let mut core: Option<RemoteBundle> = None;
        let mut plugins: Option<RemoteBundle> = None;
        let mut last_error: Option<LoadError> = None;

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }

            // Bundles still missing are fetched concurrently; ones that
            // already succeeded are not refetched.
            let (core_result, plugins_result) = tokio::join!(
                self.fetch_if_missing(BundleKind::Core, core.is_some()),
                self.fetch_if_missing(BundleKind::Plugins, plugins.is_some()),
            );

            for (slot, result) in [(&mut core, core_result), (&mut plugins, plugins_result)] {
                match result {
                    Some(Ok(bundle)) => *slot = Some(bundle),
                    Some(Err(e)) => {
                        warn!("load attempt {}/{} failed: {}", attempt, attempts, e);
                        last_error = Some(e);
                    }
                    None => {}
                }
            }

            if core.is_some() && plugins.is_some() {
                break;
            }

            if attempt < attempts {
                let delay = self.config.backoff_delay_ms(attempt);
                debug!("retrying cdn load in {}ms", delay);
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
                    _ = cancel.cancelled() => return Err(LoadError::Cancelled),
                }
            }
        }

        let core = match core {
            Some(bundle) => CoreModule::remote(bundle.artifact, bundle.module),
            None => {
                self.check_fallback_allowed(attempts, &last_error)?;
                warn!("core bundle unreachable, using embedded fallback engine");
                CoreModule::fallback()
            }
        };
        let plugins = match plugins {
            Some(bundle) => PluginModule::remote(bundle.artifact, bundle.module),
            None => {
                self.check_fallback_allowed(attempts, &last_error)?;
                warn!("plugins bundle unreachable, using embedded fallback plugins");
                PluginModule::fallback()
            }
        };

        Ok(LoadedDependencies { core, plugins })
    }

    fn check_fallback_allowed(
        &self,
        attempts: u32,
        last_error: &Option<LoadError>,
    ) -> Result<(), LoadError> {
        if self.config.enable_fallback {
            return Ok(());
        }
        Err(LoadError::Exhausted {
            attempts,
            last: last_error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    async fn fetch_if_missing(
        &self,
        kind: BundleKind,
        already_loaded: bool,
    ) -> Option<Result<RemoteBundle, LoadError>> {
        if already_loaded {
            return None;
        }
        Some(self.fetch_bundle(kind).await)
    }

    async fn fetch_bundle(&self, kind: BundleKind) -> Result<RemoteBundle, LoadError> {
        let fetched = self.source.fetch(kind).await?;
        let module = bundle::validate(&self.wasm_engine, &fetched)?;
        info!(
            "{} bundle loaded from {} ({} bytes)",
            kind,
            fetched.url,
            fetched.bytes.len()
        );
        Ok(RemoteBundle {
            artifact: BundleArtifact {
                kind,
                url: fetched.url,
                bytes: fetched.bytes,
            },
            module,
        })
    }
}
