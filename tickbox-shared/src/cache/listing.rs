/// Cache-aside cache for paginated todo listings
///
/// Reads check the cache first and fall back to the database on a miss, then
/// populate the cache; every todo mutation clears the whole
/// `todos:listing:` namespace so no stale page survives a write.
///
/// Keys are derived deterministically from the page parameters
/// (`todos:listing:{page}:{limit}`) and entries carry a 1 hour TTL. The
/// cached value is the structured page itself, so cache hits and database
/// reads are indistinguishable to callers.
///
/// The cache is behind the [`ListingCache`] trait so the API server can be
/// constructed against [`RedisListingCache`] in production and
/// [`MemoryListingCache`] in tests, without environment-based branching.

use crate::cache::client::{RedisClient, RedisClientError};
use crate::models::todo::Todo;
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Namespace prefix for all listing keys
const LISTING_PREFIX: &str = "todos:listing:";

/// Entry lifetime when no mutation invalidates it first
pub const LISTING_TTL_SECS: u64 = 3600;

/// Cache layer errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Underlying Redis failure
    #[error("Cache backend error: {0}")]
    Backend(#[from] RedisClientError),

    /// Cached payload could not be (de)serialized
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.into())
    }
}

/// Pagination metadata returned alongside every listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Total number of todos across all pages
    pub total_items: i64,

    /// Number of pages at the current page size
    pub total_pages: i64,

    /// The requested page (1-based)
    pub current_page: u32,

    /// The requested page size
    pub items_per_page: u32,
}

impl PageMeta {
    /// Computes metadata for a page
    pub fn new(total_items: i64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            (total_items + i64::from(limit) - 1) / i64::from(limit)
        };

        Self {
            total_items,
            total_pages,
            current_page: page,
            items_per_page: limit,
        }
    }
}

/// One listing page: items plus pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoPage {
    /// The todos on this page, newest first
    pub data: Vec<Todo>,

    /// Pagination metadata
    pub meta: PageMeta,
}

/// Derives the cache key for a `(page, limit)` pair
pub fn listing_key(page: u32, limit: u32) -> String {
    format!("{}{}:{}", LISTING_PREFIX, page, limit)
}

/// Read-through cache for todo listing pages
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait ListingCache: Send + Sync {
    /// Looks up a cached page; `Ok(None)` on a miss
    async fn get(&self, page: u32, limit: u32) -> Result<Option<TodoPage>, CacheError>;

    /// Stores a page under its derived key with the listing TTL
    async fn put(&self, page: u32, limit: u32, value: &TodoPage) -> Result<(), CacheError>;

    /// Deletes every cached listing page
    ///
    /// Called after every todo mutation. Broad on purpose: clearing the
    /// whole namespace guarantees no stale page survives a write.
    async fn invalidate_all(&self) -> Result<(), CacheError>;

    /// Reports whether the cache backend is reachable
    ///
    /// Used by health checks; backends without a connection always report
    /// healthy.
    async fn healthy(&self) -> bool {
        true
    }
}

/// Redis-backed listing cache
#[derive(Clone)]
pub struct RedisListingCache {
    client: RedisClient,
}

impl RedisListingCache {
    /// Creates a listing cache on top of an existing Redis client
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ListingCache for RedisListingCache {
    async fn get(&self, page: u32, limit: u32) -> Result<Option<TodoPage>, CacheError> {
        let mut conn = self.client.get_connection();
        let raw: Option<String> = conn.get(listing_key(page, limit)).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, page: u32, limit: u32, value: &TodoPage) -> Result<(), CacheError> {
        let mut conn = self.client.get_connection();
        let json = serde_json::to_string(value)?;

        let _: () = conn
            .set_ex(listing_key(page, limit), json, LISTING_TTL_SECS)
            .await?;

        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), CacheError> {
        let mut conn = self.client.get_connection();

        // Collect every key under the listing namespace first; SCAN holds a
        // borrow on the connection, so deletion happens in a second pass.
        let keys: Vec<String> = {
            let mut iter = conn
                .scan_match::<_, String>(format!("{}*", LISTING_PREFIX))
                .await?;

            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if !keys.is_empty() {
            tracing::debug!(count = keys.len(), "Invalidating cached listing pages");
            let _: () = conn.del(keys).await?;
        }

        Ok(())
    }

    async fn healthy(&self) -> bool {
        self.client.ping().await.unwrap_or(false)
    }
}

/// In-memory listing cache
///
/// A test double for [`RedisListingCache`]: same observable behavior minus
/// TTL expiry, which tests never wait out.
#[derive(Default)]
pub struct MemoryListingCache {
    entries: Mutex<HashMap<(u32, u32), TodoPage>>,
}

impl MemoryListingCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ListingCache for MemoryListingCache {
    async fn get(&self, page: u32, limit: u32) -> Result<Option<TodoPage>, CacheError> {
        Ok(self.entries.lock().unwrap().get(&(page, limit)).cloned())
    }

    async fn put(&self, page: u32, limit: u32, value: &TodoPage) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert((page, limit), value.clone());
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), CacheError> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_page(page: u32, limit: u32, total: i64) -> TodoPage {
        let todo = Todo {
            id: Uuid::new_v4(),
            title: "Buy milk".to_string(),
            completed: false,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        TodoPage {
            data: vec![todo],
            meta: PageMeta::new(total, page, limit),
        }
    }

    #[test]
    fn test_listing_key_derivation() {
        assert_eq!(listing_key(1, 10), "todos:listing:1:10");
        assert_eq!(listing_key(3, 25), "todos:listing:3:25");
    }

    #[test]
    fn test_page_meta_math() {
        // 15 items at 10 per page -> 2 pages
        let meta = PageMeta::new(15, 1, 10);
        assert_eq!(meta.total_items, 15);
        assert_eq!(meta.total_pages, 2);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.items_per_page, 10);

        // Exact multiple
        assert_eq!(PageMeta::new(20, 2, 10).total_pages, 2);

        // Empty table
        assert_eq!(PageMeta::new(0, 1, 10).total_pages, 0);
    }

    #[test]
    fn test_page_meta_serializes_camel_case() {
        let json = serde_json::to_value(PageMeta::new(15, 1, 10)).unwrap();
        assert_eq!(json["totalItems"], 15);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["itemsPerPage"], 10);
    }

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = MemoryListingCache::new();
        let page = sample_page(1, 10, 1);

        assert!(cache.get(1, 10).await.unwrap().is_none());

        cache.put(1, 10, &page).await.unwrap();
        let hit = cache.get(1, 10).await.unwrap().expect("should hit");
        assert_eq!(hit, page);

        // Different key, still a miss
        assert!(cache.get(2, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_invalidate_all() {
        let cache = MemoryListingCache::new();

        cache.put(1, 10, &sample_page(1, 10, 12)).await.unwrap();
        cache.put(2, 10, &sample_page(2, 10, 12)).await.unwrap();
        assert_eq!(cache.len(), 2);

        cache.invalidate_all().await.unwrap();
        assert!(cache.is_empty());
        assert!(cache.get(1, 10).await.unwrap().is_none());
    }
}
