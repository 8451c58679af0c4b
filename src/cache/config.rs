//! Cache configuration.

use std::time::Duration;

/// Bounds for an in-memory cache tier.
///
/// The default is unbounded with no expiry: entries live until they are
/// cleared or the process ends. Setting a capacity or TTL lets moka evict,
/// after which a persistent hit may have to be promoted again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries. `None` means unbounded.
    pub max_capacity: Option<u64>,

    /// Time-to-live for entries. `None` means entries never expire.
    pub ttl: Option<Duration>,
}

impl CacheConfig {
    /// Unbounded, never-expiring cache.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a new cache config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity: Some(max_capacity),
            ..Default::default()
        }
    }

    /// Set max capacity for cache (builder pattern).
    #[must_use]
    pub fn max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Set time-to-live for cache entries.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.ttl = Some(duration);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_capacity.is_none() && self.ttl.is_none()
    }
}
