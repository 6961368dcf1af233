//! CDN dependency loader for the DataPrism analytics bundles.
//!
//! Fetches the externally hosted core and plugins bundles over HTTP,
//! masking transient network failures with retry/backoff and degrading to
//! embedded in-memory fallbacks when the CDN is unreachable. Every loaded
//! sub-resource carries a [`Provenance`] tag so callers can tell a real
//! remote load from a degraded one.
//!
//! ```no_run
//! use dataprism_loader::{DependencyLoader, LoaderConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = DependencyLoader::new(LoaderConfig::default());
//! let deps = loader.load_dependencies().await?;
//! let engine = deps.core.engine()?;
//! engine.initialize().await?;
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod plugins;
pub mod source;
pub mod telemetry;

pub use bundle::BundleKind;
pub use config::LoaderConfig;
pub use engine::AnalyticsEngine;
pub use error::{EngineError, LoadError, PluginError};
pub use loader::dependencies::{BundleArtifact, LoadedDependencies, Provenance};
pub use loader::dependency_loader::{DependencyLoader, LoaderState};
pub use plugins::{Plugin, PluginManager};
