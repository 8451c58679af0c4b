//! Cache module - layered async memoization built on Moka.
//!
//! Three variants, each with its own policy:
//!
//! - `TieredCache` - memory tier in front of a persistent store, read-through,
//!   persistent hits promoted into memory, clear-all over both tiers
//! - `FetchCache` - memory only, wraps an async producer per key, concurrent
//!   callers share one in-flight producer
//! - `ResolutionCache` - memory only, loads each identifier once through a
//!   [`Resolver`](crate::loader::Resolver)
//!
//! None of them cache failures.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let cache = TieredCache::new(Arc::new(MemoryStore::new()), DEFAULT_PREFIX, &CacheConfig::default());
//!
//! cache.set("a", "1");
//! assert_eq!(cache.get("a").as_deref(), Some("1"));
//!
//! let body = cache.fetch_through(url, || fetcher.fetch_text(url)).await?;
//! ```

mod coalescing;
mod config;
mod memory;
mod resolution;
mod tiered;

pub use coalescing::FetchCache;
pub use config::CacheConfig;
pub use memory::MemoryTier;
pub use resolution::ResolutionCache;
pub use tiered::{DEFAULT_PREFIX, Lookup, TieredCache};
