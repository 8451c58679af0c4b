//! Plain text fetcher.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error};
use url::Url;

use super::FetchError;
use crate::cache::TieredCache;

/// Reusable HTTP client for fetching text resources.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given request timeout.
    ///
    /// # Errors
    /// Returns error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url` and return the body as text.
    ///
    /// # Errors
    /// Returns `FetchError::Status` for non-2xx responses.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let url = Url::parse(url)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(&url, status));
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }

    /// Fetch `url` through the tiered cache, keyed by the URL.
    ///
    /// # Errors
    /// Returns the fetch error; failed fetches are never cached.
    pub async fn fetch_cached(&self, cache: &TieredCache, url: &str) -> Result<String, FetchError> {
        cache
            .fetch_through(url, || self.fetch_text(url))
            .await
            .inspect_err(|e| error!("Cache fetch failed for {}: {}", url, e))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::{CacheConfig, DEFAULT_PREFIX};
    use crate::storage::{MemoryStore, PersistentStore};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/snippet.html")
            .with_status(200)
            .with_body("<button>ok</button>")
            .create_async()
            .await;

        let body = fetcher()
            .fetch_text(&format!("{}/snippet.html", server.url()))
            .await
            .unwrap();

        assert_eq!(body, "<button>ok</button>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let err = fetcher()
            .fetch_text(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = fetcher().fetch_text("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_fetch_cached_hits_network_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tokens.css")
            .with_status(200)
            .with_body(":root { --accent: teal; }")
            .expect(1)
            .create_async()
            .await;

        let store = MemoryStore::new();
        let cache = TieredCache::new(Arc::new(store.clone()), DEFAULT_PREFIX, &CacheConfig::default());
        let url = format!("{}/tokens.css", server.url());
        let fetcher = fetcher();

        let first = fetcher.fetch_cached(&cache, &url).await.unwrap();
        let second = fetcher.fetch_cached(&cache, &url).await.unwrap();

        assert_eq!(first, second);
        assert!(store.get(&format!("{DEFAULT_PREFIX}{url}")).unwrap().is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_cached_does_not_cache_failures() {
        let mut server = mockito::Server::new_async().await;
        let _flaky = server
            .mock("GET", "/flaky")
            .with_status(503)
            .create_async()
            .await;

        let cache = TieredCache::new(Arc::new(MemoryStore::new()), DEFAULT_PREFIX, &CacheConfig::default());
        let url = format!("{}/flaky", server.url());

        let err = fetcher().fetch_cached(&cache, &url).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(cache.get(&url), None);
    }
}
