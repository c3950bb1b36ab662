use super::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Plain `reqwest` client with bounded timeouts.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("launch_atlas/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .0
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting '{url}'"))?
            .error_for_status()
            .with_context(|| format!("fetching '{url}'"))?;
        Ok(resp.bytes().await?.to_vec())
    }
}
