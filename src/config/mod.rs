//! Configuration module for uicache.
//!
//! Loads configuration from environment variables (and `.env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::{CacheConfig, DEFAULT_PREFIX};
use crate::http::DEFAULT_API_BASE;
use crate::storage::DEFAULT_QUOTA_BYTES;

/// Where the persistent tier lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// JSON document at `storage_path`.
    #[default]
    File,
    /// In-process only; nothing survives a restart.
    Memory,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Reserved key prefix for the tiered cache's persistent entries.
    pub prefix: String,

    pub storage_mode: StorageMode,
    pub storage_path: PathBuf,

    /// Byte quota for the file store. `None` means unlimited.
    pub storage_quota: Option<usize>,

    // HTTP
    pub api_base: String,
    pub http_timeout: Duration,

    /// Root directory for module paths resolved by `load`.
    pub module_root: PathBuf,

    /// Bounds shared by the in-memory tiers (unbounded by default).
    pub memory: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unset variables take their defaults; unparsable ones are logged and
    /// also fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage_mode = match var("UICACHE_STORAGE").map(|v| v.to_lowercase()).as_deref() {
            Some("memory") => StorageMode::Memory,
            _ => StorageMode::File,
        };

        // 0 disables the quota
        let storage_quota = match parse_var::<usize>(&var, "UICACHE_STORAGE_QUOTA") {
            Some(0) => None,
            Some(bytes) => Some(bytes),
            None => Some(DEFAULT_QUOTA_BYTES),
        };

        let mut memory = CacheConfig::unbounded();
        if let Some(max) = parse_var::<u64>(&var, "UICACHE_MAX_ENTRIES") {
            memory = memory.max_capacity(max);
        }
        if let Some(secs) = parse_var::<u64>(&var, "UICACHE_TTL_SECS") {
            memory = memory.ttl(Duration::from_secs(secs));
        }

        Self {
            prefix: var("UICACHE_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            storage_mode,
            storage_path: var("UICACHE_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".uicache/storage.json")),
            storage_quota,
            api_base: var("UICACHE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            http_timeout: Duration::from_secs(
                parse_var(&var, "UICACHE_HTTP_TIMEOUT_SECS").unwrap_or(30),
            ),
            module_root: var("UICACHE_MODULE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            memory,
        }
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}
