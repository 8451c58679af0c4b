//! Application state - every cache built once per process.

use std::sync::Arc;

use anyhow::Context;
use futures::future::try_join_all;
use tracing::{info, warn};
use url::Url;

use crate::cache::{ResolutionCache, TieredCache};
use crate::config::{Config, StorageMode};
use crate::http::{ApiClient, HttpFetcher};
use crate::loader::{FileResolver, HttpResolver, LoadedUnit, ResolveError};
use crate::services::PostService;
use crate::storage::{FileStore, MemoryStore, PersistentStore};

/// Shared state handed to every command.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Tiered cache for fetched content.
    pub content: TieredCache,

    pub fetcher: HttpFetcher,

    /// Post service with its coalescing listing cache.
    pub posts: PostService,

    /// Module paths resolved under the configured root.
    pub modules: ResolutionCache<FileResolver>,

    /// Units loaded by URL.
    pub remote: ResolutionCache<HttpResolver>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// An unreadable storage file is not fatal: the tiered cache falls back
    /// to an in-memory store.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built or the API base is
    /// not a valid URL.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = open_store(config);
        let content = TieredCache::new(store, config.prefix.as_str(), &config.memory);

        let fetcher =
            HttpFetcher::new(config.http_timeout).context("Failed to build HTTP client")?;
        let api = ApiClient::new(&config.api_base, &fetcher)
            .with_context(|| format!("Invalid API base {}", config.api_base))?;
        let posts = PostService::new(api, &config.memory);

        let modules = ResolutionCache::new(FileResolver::new(&config.module_root));
        let remote = ResolutionCache::new(HttpResolver::new(fetcher.clone()));

        info!("Caches initialized (prefix {})", config.prefix);

        Ok(Self {
            content,
            fetcher,
            posts,
            modules,
            remote,
        })
    }

    /// Resolve identifiers concurrently, preserving order.
    ///
    /// Absolute `http`/`https` URLs go to the remote cache, everything else
    /// is a module path under the module root.
    ///
    /// # Errors
    /// Returns the first resolution error.
    pub async fn load<I, S>(&self, ids: I) -> Result<Vec<Arc<LoadedUnit>>, Arc<ResolveError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();
        try_join_all(ids.iter().map(|id| self.load_one(id))).await
    }

    async fn load_one(&self, id: &str) -> Result<Arc<LoadedUnit>, Arc<ResolveError>> {
        if is_remote(id) {
            self.remote.resolve(id).await
        } else {
            self.modules.resolve(id).await
        }
    }
}

fn is_remote(id: &str) -> bool {
    Url::parse(id)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn open_store(config: &Config) -> Arc<dyn PersistentStore> {
    match config.storage_mode {
        StorageMode::Memory => {
            info!("Using in-memory storage");
            Arc::new(MemoryStore::new())
        }
        StorageMode::File => match FileStore::open(&config.storage_path, config.storage_quota) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(
                    "Storage at {} unavailable ({}), continuing in memory",
                    config.storage_path.display(),
                    e
                );
                Arc::new(MemoryStore::new())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_corrupt_storage_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "garbage").unwrap();

        let config = Config {
            storage_path: path.clone(),
            module_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::new(&config).unwrap();

        state.content.set("a", "1");
        assert_eq!(state.content.get("a").as_deref(), Some("1"));
        // The corrupt file is left alone.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "garbage");
    }

    #[tokio::test]
    async fn test_file_storage_persists_across_states() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_path: dir.path().join("storage.json"),
            module_root: dir.path().to_path_buf(),
            ..Config::default()
        };

        AppState::new(&config).unwrap().content.set("theme", "dark");

        let reloaded = AppState::new(&config).unwrap();
        assert_eq!(
            reloaded.content.lookup("theme"),
            crate::cache::Lookup::Persistent("dark".into())
        );

        reloaded.content.clear();
        assert_eq!(AppState::new(&config).unwrap().content.get("theme"), None);
    }

    #[tokio::test]
    async fn test_load_routes_urls_and_paths() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/modules/header.js")
            .with_status(200)
            .with_body("export const header = true;")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("toolbar.js"), "export const toolbar = 1;").unwrap();

        let config = Config {
            storage_mode: StorageMode::Memory,
            module_root: dir.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::new(&config).unwrap();

        let url = format!("{}/modules/header.js", server.url());
        let units = state.load([url.as_str(), "toolbar.js", url.as_str()]).await.unwrap();

        assert_eq!(units[0].content, "export const header = true;");
        assert_eq!(units[0].origin, url);
        assert_eq!(units[1].content, "export const toolbar = 1;");
        assert!(Arc::ptr_eq(&units[0], &units[2]));
        assert!(state.remote.is_resolved(&url));
        assert!(state.modules.is_resolved("toolbar.js"));
        assert!(!state.modules.is_resolved(&url));
        mock.assert_async().await;
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://cdn.example.com/lazyLoad.js"));
        assert!(is_remote("http://127.0.0.1:8080/x.js"));
        assert!(!is_remote("modules/registry.js"));
        assert!(!is_remote("/modules/registry.js"));
        assert!(!is_remote("file:///etc/hosts"));
    }

    #[test]
    fn test_invalid_api_base_is_an_error() {
        let config = Config {
            api_base: "not a url".into(),
            storage_mode: StorageMode::Memory,
            ..Config::default()
        };
        assert!(AppState::new(&config).is_err());
    }
}
