// Bundle fetching — the network seam between the loader and the CDN.

pub mod http_source;
pub mod traits;
