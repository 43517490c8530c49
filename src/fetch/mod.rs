//! Loading the raw punctuality export from disk or over HTTP.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Returns `true` when `source` should be downloaded rather than read from disk.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Downloads `url`, failing on non-success HTTP statuses.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()?;
    let bytes = resp.bytes().await?.to_vec();

    info!(url, bytes = bytes.len(), "Raw data downloaded");
    Ok(bytes)
}

/// Loads the raw data from a local path or an HTTP(S) URL.
#[tracing::instrument(skip(client))]
pub async fn read_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    if is_remote(source) {
        fetch_bytes(client, source).await
    } else {
        debug!("Reading local file");
        std::fs::read(source).with_context(|| format!("failed to read {source}"))
    }
}
