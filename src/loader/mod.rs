//! Dynamic content loaders.
//!
//! A [`Resolver`] turns an identifier (a module path or a URL) into a loaded
//! unit. Resolvers do no caching of their own; wrap them in a
//! [`ResolutionCache`](crate::cache::ResolutionCache) for that.

mod file;
mod remote;

use async_trait::async_trait;
use thiserror::Error;

use crate::http::FetchError;

pub use file::FileResolver;
pub use remote::HttpResolver;

/// Errors raised while resolving an identifier.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("nothing found for {0}")]
    NotFound(String),

    /// Identifier is not acceptable to this resolver (e.g. escapes the root).
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("failed to read unit: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// A unit of code or content loaded by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedUnit {
    /// Identifier the unit was resolved from.
    pub id: String,
    /// Where it actually came from (file path or URL).
    pub origin: String,
    pub content: String,
}

/// Async resolution step used by the resolution cache.
#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    type Output: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn resolve(&self, id: &str) -> Result<Self::Output, Self::Error>;
}
