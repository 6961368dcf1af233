use async_trait::async_trait;
use bytes::Bytes;

use crate::bundle::BundleKind;
use crate::error::LoadError;

/// Raw bytes of a bundle together with the URL they came from.
#[derive(Debug, Clone)]
pub struct FetchedBundle {
    pub kind: BundleKind,
    pub url: String,
    pub bytes: Bytes,
}

/// Where bundle bytes come from. The production implementation is
/// [`HttpBundleSource`](super::http_source::HttpBundleSource); tests inject
/// counting or failing sources.
#[async_trait]
pub trait BundleSource: Send + Sync {
    async fn fetch(&self, kind: BundleKind) -> Result<FetchedBundle, LoadError>;
}
