use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::traits::{BundleSource, FetchedBundle};
use crate::bundle::BundleKind;
use crate::config::LoaderConfig;
use crate::error::LoadError;

/// Fetches bundles over HTTP(S) from the configured base URLs.
///
/// The timeout is hard: `tokio::time::timeout` drops the in-flight reqwest
/// future on expiry, which cancels the underlying request.
pub struct HttpBundleSource {
    client: Client,
    core_base_url: String,
    plugins_base_url: String,
    timeout: Duration,
}

impl HttpBundleSource {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            client: Client::new(),
            core_base_url: config.core_base_url.clone(),
            plugins_base_url: config.plugins_base_url.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Fully-qualified URL for a bundle: `<base>/<file>`.
    pub fn url_for(&self, kind: BundleKind) -> String {
        let base = match kind {
            BundleKind::Core => self.core_base_url.trim_end_matches('/'),
            BundleKind::Plugins => self.plugins_base_url.trim_end_matches('/'),
        };
        format!("{}/{}", base, kind.bundle_file())
    }

    async fn fetch_inner(&self, kind: BundleKind, url: &str) -> Result<FetchedBundle, LoadError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Network {
                url: url.to_string(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("bundle fetch failed url={} status={}", url, status.as_u16());
            return Err(LoadError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| LoadError::Network {
            url: url.to_string(),
            source: e,
        })?;

        if bytes.is_empty() {
            return Err(LoadError::InvalidBundle {
                url: url.to_string(),
                reason: "empty response body".to_string(),
            });
        }

        debug!("fetched {} bundle from {} ({} bytes)", kind, url, bytes.len());
        Ok(FetchedBundle {
            kind,
            url: url.to_string(),
            bytes,
        })
    }
}

#[async_trait]
impl BundleSource for HttpBundleSource {
    async fn fetch(&self, kind: BundleKind) -> Result<FetchedBundle, LoadError> {
        let url = self.url_for(kind);
        match tokio::time::timeout(self.timeout, self.fetch_inner(kind, &url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("bundle fetch timed out url={}", url);
                Err(LoadError::Timeout {
                    url,
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building_strips_trailing_slash() {
        let config = LoaderConfig {
            core_base_url: "https://cdn.example/core/".into(),
            plugins_base_url: "https://cdn.example/plugins".into(),
            ..LoaderConfig::default()
        };
        let source = HttpBundleSource::new(&config);
        assert_eq!(
            source.url_for(BundleKind::Core),
            "https://cdn.example/core/dataprism-core.wasm"
        );
        assert_eq!(
            source.url_for(BundleKind::Plugins),
            "https://cdn.example/plugins/dataprism-plugins.wasm"
        );
    }
}
