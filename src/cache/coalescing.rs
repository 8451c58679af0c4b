//! Coalescing fetch cache.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use super::CacheConfig;

/// Memory-only cache that wraps an async producer per key.
///
/// Once a key holds a value the producer is never called for it again.
/// Concurrent callers on a missing key share a single in-flight producer:
/// the first caller runs it, the rest wait for its result. A failed producer
/// leaves the key empty and every waiter gets the same `Arc`'d error, so the
/// next call starts a fresh attempt.
pub struct FetchCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, V>,
    name: Arc<str>,
}

impl<K, V> Clone for FetchCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            name: Arc::clone(&self.name),
        }
    }
}

impl<K, V> FetchCache<K, V>
where
    K: Hash + Eq + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty fetch cache with the given name and bounds.
    pub fn new(name: impl Into<Arc<str>>, config: &CacheConfig) -> Self {
        let mut builder = Cache::builder();

        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            inner: builder.build(),
            name: name.into(),
        }
    }

    /// Name used in log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the value stored under `key`, running `producer` only if
    /// there is none.
    ///
    /// # Errors
    /// Returns the producer's error. Callers that were waiting on the same
    /// in-flight producer receive the same error.
    pub async fn cached_fetch<F, Fut, E>(&self, key: K, producer: F) -> Result<V, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        if let Some(value) = self.inner.get(&key).await {
            debug!("[{}] hit: {:?}", self.name, key);
            return Ok(value);
        }

        debug!("[{}] miss: {:?}", self.name, key);
        // Only the caller that wins the init race polls this, so losing
        // callers never invoke their producer.
        self.inner
            .try_get_with(key, async move { producer().await })
            .await
    }

    /// Peek at a stored value without producing one.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    /// Whether a settled value is stored for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }
}

impl<K, V> std::fmt::Debug for FetchCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCache")
            .field("name", &self.name)
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn posts_cache() -> FetchCache<String, Vec<u32>> {
        FetchCache::new("posts", &CacheConfig::default())
    }

    #[tokio::test]
    async fn test_second_producer_never_runs() {
        let cache = posts_cache();
        let b_calls = AtomicUsize::new(0);
        let counter = &b_calls;

        let a = cache
            .cached_fetch("posts".to_string(), || async {
                Ok::<_, String>(vec![1, 2, 3])
            })
            .await
            .unwrap();

        let b = cache
            .cached_fetch("posts".to_string(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(vec![9])
            })
            .await
            .unwrap();

        assert_eq!(a, vec![1, 2, 3]);
        assert_eq!(b, a);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = posts_cache();

        let err = cache
            .cached_fetch("posts".to_string(), || async {
                Err::<Vec<u32>, _>("API Error: 500".to_string())
            })
            .await
            .unwrap_err();
        assert_eq!(err.as_str(), "API Error: 500");
        assert!(!cache.contains(&"posts".to_string()));

        let value = cache
            .cached_fetch("posts".to_string(), || async { Ok::<_, String>(vec![7]) })
            .await
            .unwrap();
        assert_eq!(value, vec![7]);
        assert_eq!(cache.get(&"posts".to_string()).await, Some(vec![7]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_producer() {
        let cache = posts_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .cached_fetch("posts".to_string(), || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, String>(vec![42])
                        })
                        .await
                })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            assert_eq!(handle.unwrap().unwrap(), vec![42]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
