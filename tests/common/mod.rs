#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use dataprism_loader::LoaderConfig;

// Guest fixture shared with the dispatch unit tests: marker export,
// bump-allocator ABI, and an entry point that answers every call with one
// canned JSON response.
const BUNDLE_WAT_TEMPLATE: &str = include_str!("../fixtures/canned_bundle.wat");

fn bundle_wat(marker: &str, entry: &str, response: &str) -> String {
    BUNDLE_WAT_TEMPLATE
        .replace("MARKER_EXPORT", marker)
        .replace("ENTRY_EXPORT", entry)
        .replace(
            "RESPONSE_JSON",
            &response.replace('\\', "\\\\").replace('"', "\\\""),
        )
        .replace("RESPONSE_PTR", "0")
        .replace("RESPONSE_LEN", &response.len().to_string())
}

pub fn core_bundle_wat(response: &str) -> String {
    bundle_wat("DataPrismEngine", "dataprism_call", response)
}

pub fn plugins_bundle_wat(response: &str) -> String {
    bundle_wat("PluginManager", "plugin_call", response)
}

/// What a mock CDN route serves.
#[derive(Clone)]
pub enum Served {
    /// 200 with the given body, after an optional delay.
    Body(String, Duration),
    /// A plain server error on every request.
    Error,
}

impl Served {
    pub fn ok(body: String) -> Self {
        Served::Body(body, Duration::ZERO)
    }

    pub fn slow(body: String, delay: Duration) -> Self {
        Served::Body(body, delay)
    }
}

pub struct MockCdn {
    pub addr: SocketAddr,
    pub core_hits: Arc<AtomicUsize>,
    pub plugins_hits: Arc<AtomicUsize>,
}

impl MockCdn {
    /// Serve both bundle files from one listener on 127.0.0.1, counting
    /// requests per bundle.
    pub async fn start(core: Served, plugins: Served) -> Self {
        dataprism_loader::telemetry::init_tracing();

        let core_hits = Arc::new(AtomicUsize::new(0));
        let plugins_hits = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route(
                "/dataprism-core.wasm",
                get({
                    let hits = Arc::clone(&core_hits);
                    move || serve(core.clone(), hits)
                }),
            )
            .route(
                "/dataprism-plugins.wasm",
                get({
                    let hits = Arc::clone(&plugins_hits);
                    move || serve(plugins.clone(), hits)
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            core_hits,
            plugins_hits,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Loader config pointing both bundles at this mock, with a compressed
    /// backoff schedule so retry tests stay fast.
    pub fn config(&self) -> LoaderConfig {
        LoaderConfig {
            core_base_url: self.base_url(),
            plugins_base_url: self.base_url(),
            timeout_ms: 5_000,
            backoff_base_ms: 50,
            backoff_cap_ms: 200,
            ..LoaderConfig::default()
        }
    }
}

async fn serve(served: Served, hits: Arc<AtomicUsize>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    match served {
        Served::Body(body, delay) => {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            (StatusCode::OK, body).into_response()
        }
        Served::Error => (StatusCode::INTERNAL_SERVER_ERROR, "cdn down").into_response(),
    }
}

/// A base URL nothing listens on: bind an ephemeral port, then drop it.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
