//! Post service.
//!
//! Talks to the `/posts` resource of the demo API. The listing used by the
//! dashboard goes through a coalescing cache under the key `"posts"`, so
//! repeated renders share a single request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{CacheConfig, FetchCache};
use crate::http::{ApiClient, FetchError};

/// Number of posts fetched for the listing.
const LISTING_LIMIT: usize = 6;

/// Cache key for the listing.
const POSTS_KEY: &str = "posts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub body: String,
}

/// Payload for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct PostService {
    api: ApiClient,
    cache: FetchCache<String, Vec<Post>>,
}

impl PostService {
    pub fn new(api: ApiClient, config: &CacheConfig) -> Self {
        Self {
            api,
            cache: FetchCache::new("posts", config),
        }
    }

    /// First page of posts, straight from the API.
    pub async fn all(&self) -> Result<Vec<Post>, FetchError> {
        self.api
            .get_json(&format!("/posts?_limit={LISTING_LIMIT}"))
            .await
    }

    pub async fn by_id(&self, id: u64) -> Result<Post, FetchError> {
        self.api.get_json(&format!("/posts/{id}")).await
    }

    pub async fn create(&self, post: &NewPost) -> Result<Post, FetchError> {
        let created: Post = self.api.post_json("/posts", post).await?;
        info!("Created post {}", created.id);
        Ok(created)
    }

    /// The listing, fetched once and then served from memory.
    pub async fn cached_all(&self) -> Result<Vec<Post>, Arc<FetchError>> {
        self.cache
            .cached_fetch(POSTS_KEY.to_string(), || self.all())
            .await
    }
}
