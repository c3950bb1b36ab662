use anyhow::Result;
use async_trait::async_trait;

/// Anything that can download a dataset payload.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GETs `url` and returns the body; non-success statuses are errors.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}
