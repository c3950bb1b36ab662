//! Dataset loading from local files or HTTP, with transparent gzip support.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Downloads `url` through `client`.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    client.get_bytes(url).await
}

/// Inflates gzip payloads; anything else is returned unchanged.
pub fn maybe_decompress(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut out)
        .context("decompressing gzip payload")?;
    Ok(out)
}

/// Loads a dataset from a local path or an `http(s)` URL.
#[tracing::instrument(fields(source = %source))]
pub async fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source).with_context(|| format!("reading '{source}'"))?
    };
    debug!(bytes = bytes.len(), "Dataset bytes loaded");
    maybe_decompress(bytes)
}
