//! Resolve URLs over HTTP.

use async_trait::async_trait;

use super::{LoadedUnit, ResolveError, Resolver};
use crate::http::{FetchError, HttpFetcher};

/// Loads units by URL. A 404 maps to [`ResolveError::NotFound`].
#[derive(Debug, Clone)]
pub struct HttpResolver {
    fetcher: HttpFetcher,
}

impl HttpResolver {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    type Output = LoadedUnit;
    type Error = ResolveError;

    async fn resolve(&self, id: &str) -> Result<LoadedUnit, ResolveError> {
        let content = self.fetcher.fetch_text(id).await.map_err(|e| match e {
            FetchError::Status { status: 404, .. } => ResolveError::NotFound(id.to_string()),
            other => ResolveError::Fetch(other),
        })?;

        Ok(LoadedUnit {
            id: id.to_string(),
            origin: id.to_string(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_resolve_and_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _found = server
            .mock("GET", "/modules/header.js")
            .with_status(200)
            .with_body("export const header = true;")
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/modules/gone.js")
            .with_status(404)
            .create_async()
            .await;

        let resolver = HttpResolver::new(HttpFetcher::new(Duration::from_secs(5)).unwrap());

        let url = format!("{}/modules/header.js", server.url());
        let unit = resolver.resolve(&url).await.unwrap();
        assert_eq!(unit.content, "export const header = true;");
        assert_eq!(unit.origin, url);

        let gone = format!("{}/modules/gone.js", server.url());
        let err = resolver.resolve(&gone).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }
}
