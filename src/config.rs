use serde::Deserialize;

/// Default CDN base URL for the analytics core bundle.
pub const DEFAULT_CORE_BASE_URL: &str = "https://srnarasim.github.io/dataprism-core";

/// Default CDN base URL for the plugins bundle.
pub const DEFAULT_PLUGINS_BASE_URL: &str = "https://srnarasim.github.io/dataprism-plugins";

/// File name of the core bundle under its base URL.
pub const CORE_BUNDLE_FILE: &str = "dataprism-core.wasm";

/// File name of the plugins bundle under its base URL.
pub const PLUGINS_BUNDLE_FILE: &str = "dataprism-plugins.wasm";

/// Hard per-request fetch timeout (30 s).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Number of load attempts before giving up on a bundle.
pub const DEFAULT_RETRIES: u32 = 3;

/// Base delay for exponential backoff between attempts (1 s).
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Upper bound on the backoff delay (5 s).
pub const DEFAULT_BACKOFF_CAP_MS: u64 = 5_000;

/// Maximum number of rows a fallback query returns.
pub const FALLBACK_QUERY_ROW_LIMIT: usize = 100;

/// Simulated initialization latency of the fallback engine.
pub const FALLBACK_INIT_DELAY_MS: u64 = 50;

/// Top-level configuration for the dependency loader.
///
/// Immutable after construction; every field has a default so partially
/// deserialized configs work.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Base URL the core bundle is fetched from.
    pub core_base_url: String,
    /// Base URL the plugins bundle is fetched from.
    pub plugins_base_url: String,
    /// Hard timeout for a single bundle fetch, in milliseconds.
    pub timeout_ms: u64,
    /// Number of load attempts per bundle (minimum 1).
    pub retries: u32,
    /// Whether a successful load is cached for subsequent callers.
    pub enable_cache: bool,
    /// Whether exhausted retries degrade to the embedded fallback
    /// implementations instead of surfacing an error.
    pub enable_fallback: bool,
    /// Base delay of the exponential backoff schedule, in milliseconds.
    pub backoff_base_ms: u64,
    /// Cap applied to the backoff delay, in milliseconds.
    pub backoff_cap_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            core_base_url: DEFAULT_CORE_BASE_URL.to_string(),
            plugins_base_url: DEFAULT_PLUGINS_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
            enable_cache: true,
            enable_fallback: true,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_cap_ms: DEFAULT_BACKOFF_CAP_MS,
        }
    }
}

impl LoaderConfig {
    /// Delay before the attempt following failed attempt `attempt` (1-based):
    /// `min(base * 2^(attempt-1), cap)`.
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        self.backoff_base_ms
            .saturating_mul(factor)
            .min(self.backoff_cap_ms)
    }
}
