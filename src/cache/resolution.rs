//! Memory-only resolution cache.

use std::sync::Arc;

use futures::future::try_join_all;
use moka::future::Cache;
use tracing::debug;

use crate::loader::Resolver;

/// Caches resolved units by identifier so each one is loaded once per
/// process.
///
/// No eviction, no persistence. Concurrent requests for the same
/// identifier share one resolution; failures are not stored.
pub struct ResolutionCache<R: Resolver> {
    resolver: Arc<R>,
    units: Cache<String, Arc<R::Output>>,
}

impl<R: Resolver> Clone for ResolutionCache<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            units: self.units.clone(),
        }
    }
}

impl<R: Resolver> ResolutionCache<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver: Arc::new(resolver),
            units: Cache::builder().build(),
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Return the unit for `id`, resolving it on first use.
    ///
    /// # Errors
    /// Returns the resolver's error; the identifier stays unresolved so a
    /// later call tries again.
    pub async fn resolve(&self, id: &str) -> Result<Arc<R::Output>, Arc<R::Error>> {
        if let Some(unit) = self.units.get(id).await {
            debug!("Resolution cache hit: {}", id);
            return Ok(unit);
        }

        let resolver = Arc::clone(&self.resolver);
        let owned = id.to_string();
        self.units
            .try_get_with(id.to_string(), async move {
                debug!("Resolving {}", owned);
                resolver.resolve(&owned).await.map(Arc::new)
            })
            .await
    }

    /// Resolve several identifiers concurrently, preserving order.
    ///
    /// # Errors
    /// Returns the first resolution error.
    pub async fn resolve_all<I, S>(&self, ids: I) -> Result<Vec<Arc<R::Output>>, Arc<R::Error>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();
        try_join_all(ids.iter().map(|id| self.resolve(id))).await
    }

    pub fn is_resolved(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    /// Number of resolved units.
    pub async fn len(&self) -> u64 {
        self.units.run_pending_tasks().await;
        self.units.entry_count()
    }
}

impl<R: Resolver> std::fmt::Debug for ResolutionCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("entry_count", &self.units.entry_count())
            .finish()
    }
}
