//! uicache - layered async memoization caches.
//!
//! ## Architecture
//!
//! - `cache` - tiered read-through, coalescing fetch and resolution caches (Moka)
//! - `storage` - persistent key-value stores behind the tiered cache
//! - `http` - text fetcher and JSON API client (reqwest)
//! - `loader` - resolvers that load units by path or URL
//! - `services` - domain services on top of the caches
//! - `config` - environment configuration
//! - `state` - per-process construction of all of the above

pub mod cache;
pub mod config;
pub mod http;
pub mod loader;
pub mod services;
pub mod state;
pub mod storage;

pub use cache::{CacheConfig, FetchCache, Lookup, ResolutionCache, TieredCache};
pub use config::Config;
pub use state::AppState;
