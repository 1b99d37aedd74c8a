//! One-shot retrieval of feed bytes, from a URL or from disk.

mod client;

pub use client::{BasicClient, HttpClient};

use anyhow::{Context, Result};
use tracing::debug;

/// GETs `url` and returns the body. Non-2xx responses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    let bytes = resp.bytes().await?;
    debug!(url, bytes = bytes.len(), "Fetched feed");
    Ok(bytes.to_vec())
}

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetches `source` when it is an http(s) URL, otherwise reads it as a file.
pub async fn read_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    if is_url(source) {
        fetch_bytes(client, source).await
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("failed to read {source}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/gtfs-rt/vehicles.pb"));
        assert!(is_url("http://localhost:8080/feed"));
        assert!(!is_url("feeds/vehicles.pb"));
        assert!(!is_url("httpfeed.pb"));
    }

    #[tokio::test]
    async fn test_read_source_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.pb");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let bytes = read_source(&BasicClient::default(), path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_read_source_missing_file() {
        let err = read_source(&BasicClient::default(), "does/not/exist.pb")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does/not/exist.pb"));
    }

    #[test]
    fn test_client_with_timeout_builds() {
        assert!(BasicClient::with_timeout(std::time::Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_invalid_url() {
        assert!(fetch_bytes(&BasicClient::default(), "not a url").await.is_err());
    }
}
