//! HTTP access for the caches.
//!
//! - `HttpFetcher` - text GETs, plus a read-through over the tiered cache
//! - `ApiClient` - JSON endpoints under a base URL
//!
//! Any non-2xx response is turned into [`FetchError::Status`].

mod api;
mod fetcher;

use thiserror::Error;

pub use api::{ApiClient, DEFAULT_API_BASE};
pub use fetcher::HttpFetcher;

/// Errors that can occur while fetching remote content.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection, timeout or body-read failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// HTTP status for [`FetchError::Status`], if that's what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_status(url: &url::Url, status: reqwest::StatusCode) -> Self {
        FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}
