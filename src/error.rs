// Error types — transport and content failures for the loader, usage errors
// for the engine and plugin surfaces.

use thiserror::Error;

/// Errors surfaced by the dependency loader.
///
/// Per-resource transport and content failures are absorbed into fallback
/// construction while fallback is enabled; they reach the caller only when
/// fallback is disabled (`Exhausted`) or the loader is misused (`NotLoaded`).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request for {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },
    #[error("fetch of {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("invalid bundle from {url}: {reason}")]
    InvalidBundle { url: String, reason: String },
    #[error("bundle from {url} is missing required export `{export}`")]
    MissingExport { url: String, export: String },
    #[error("all {attempts} load attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: String },
    #[error("load cycle cancelled by reset")]
    Cancelled,
    #[error("dependencies have not been loaded yet")]
    NotLoaded,
}

/// Usage and dispatch errors against an analytics engine handle.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot load an empty row batch")]
    EmptyBatch,
    #[error("table `{0}` does not exist")]
    TableNotFound(String),
    #[error("`{0}` is not a valid table identifier")]
    InvalidTableName(String),
    #[error("engine instantiation failed: {0}")]
    Instantiation(String),
    #[error("engine bundle is missing export `{0}`")]
    MissingExport(String),
    #[error("engine call failed: {0}")]
    Execution(String),
    #[error("engine returned malformed data: {0}")]
    Malformed(String),
    #[error("remote engine reported: {0}")]
    Remote(String),
}

/// Usage and dispatch errors against a plugin manager.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin `{0}` is not registered")]
    NotFound(String),
    #[error("invalid plugin input: {0}")]
    InvalidInput(String),
    #[error("plugin manager instantiation failed: {0}")]
    Instantiation(String),
    #[error("plugin call failed: {0}")]
    Execution(String),
    #[error("plugin returned malformed data: {0}")]
    Malformed(String),
    #[error("remote plugin reported: {0}")]
    Remote(String),
}
