//! JSON API client.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{FetchError, HttpFetcher};

/// Public demo API the post service talks to by default.
pub const DEFAULT_API_BASE: &str = "https://jsonplaceholder.typicode.com";

/// Client for a JSON API rooted at a base URL.
///
/// Endpoints are appended to the base verbatim, so `"/posts?_limit=6"`
/// keeps its query string and a base with a path prefix keeps it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    client: Client,
}

impl ApiClient {
    /// Create a client sharing `fetcher`'s connection pool.
    ///
    /// # Errors
    /// Returns error if `base` is not an absolute URL.
    pub fn new(base: &str, fetcher: &HttpFetcher) -> Result<Self, FetchError> {
        Url::parse(base)?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client: fetcher.client().clone(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, endpoint: &str) -> Result<Url, FetchError> {
        Ok(Url::parse(&format!("{}{}", self.base, endpoint))?)
    }

    /// GET `endpoint` and decode the JSON body.
    ///
    /// # Errors
    /// Returns error on transport failure, non-2xx status or bad JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        let url = self.url(endpoint)?;
        let request = self.client.get(url.clone());
        self.send(request, &url).await
    }

    /// POST `body` as JSON to `endpoint` and decode the JSON reply.
    ///
    /// # Errors
    /// Returns error on transport failure, non-2xx status or bad JSON.
    pub async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint)?;
        let request = self.client.post(url.clone()).body(serde_json::to_vec(body)?);
        self.send(request, &url).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, FetchError> {
        let response = request
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(url, status));
        }

        let raw = response.text().await?;
        debug!("API {} -> {} ({} bytes)", url, status, raw.len());
        Ok(serde_json::from_str(&raw)?)
    }
}
