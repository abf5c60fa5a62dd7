// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared token cache backends.
//!
//! The revocation lists live in a key/value cache with per-key TTL and
//! atomic delete. Any store with those three operations satisfies the
//! contract; the production realization is Redis, and an in-memory backend
//! serves tests and development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::AsyncCommands;

use crate::error::CacheError;

// =============================================================================
// TokenCache Trait
// =============================================================================

/// Key/value cache with per-key TTL.
///
/// Each mutation is a single atomic command; there is no multi-step
/// transaction to roll back if a request is abandoned mid-flight.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Returns the value for a key, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores a value under a key with the given time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Deletes a key. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

// =============================================================================
// Memory Cache
// =============================================================================

/// An in-memory cache for tests and development.
///
/// Entries expire lazily on read. Thread-safe via `parking_lot::RwLock`.
#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
    /// Number of upcoming operations that fail with a connection error.
    /// Test hook for exercising retry and fail-closed paths.
    fail_connections: AtomicU32,
}

impl MemoryTokenCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` operations fail with a connection error.
    pub fn fail_connections(&self, n: u32) {
        self.fail_connections.store(n, Ordering::SeqCst);
    }

    /// Returns the number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|(_, deadline)| *deadline > now)
            .count()
    }

    /// Returns `true` if the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_injected_failure(&self) -> Result<(), CacheError> {
        let remaining = self.fail_connections.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_connections.store(remaining - 1, Ordering::SeqCst);
            return Err(CacheError::connection("injected connection failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_injected_failure()?;

        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some((value, deadline)) if *deadline > Instant::now() => {
                    return Ok(Some(value.clone()))
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.entries.write().remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.check_injected_failure()?;

        let deadline = Instant::now() + ttl;
        self.entries
            .write()
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check_injected_failure()?;

        self.entries.write().remove(key);
        Ok(())
    }
}

// =============================================================================
// Redis Cache
// =============================================================================

/// A Redis-backed cache: `SET key value EX ttl` / `GET` / `DEL`.
///
/// Uses a multiplexed connection manager; cloning is cheap and each request
/// worker shares the same underlying connection pool.
#[derive(Clone)]
pub struct RedisTokenCache {
    manager: redis::aio::ConnectionManager,
}

impl RedisTokenCache {
    /// Connects to Redis at the given URL (`redis://host:port`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::internal(format!("invalid redis url: {}", e)))?;

        let manager = client
            .get_connection_manager()
            .await
            .map_err(classify_redis_error)?;

        Ok(Self { manager })
    }

    /// Wraps an existing connection manager.
    pub fn from_manager(manager: redis::aio::ConnectionManager) -> Self {
        Self { manager }
    }
}

impl std::fmt::Debug for RedisTokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTokenCache").finish()
    }
}

#[async_trait]
impl TokenCache for RedisTokenCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(classify_redis_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        // EX takes whole seconds; never let a sub-second TTL round to zero.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(classify_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        conn.del::<_, i64>(key)
            .await
            .map(|_| ())
            .map_err(classify_redis_error)
    }
}

/// Splits Redis failures into retryable connectivity errors and the rest.
fn classify_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_io_error()
        || err.is_timeout()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
    {
        CacheError::connection(err.to_string())
    } else {
        CacheError::internal(err.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = MemoryTokenCache::new();

        cache
            .set("white_list:abc", "token", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get("white_list:abc").await.unwrap(),
            Some("token".to_string())
        );
        assert_eq!(cache.get("white_list:other").await.unwrap(), None);

        cache.delete("white_list:abc").await.unwrap();
        assert_eq!(cache.get("white_list:abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_expiry() {
        let cache = MemoryTokenCache::new();

        cache
            .set("k", "v", Duration::from_millis(10))
            .await
            .unwrap();
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_memory_cache_delete_absent_is_noop() {
        let cache = MemoryTokenCache::new();
        assert!(cache.delete("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_cache_injected_failures() {
        let cache = MemoryTokenCache::new();
        cache.fail_connections(2);

        assert!(matches!(
            cache.get("k").await,
            Err(CacheError::Connection { .. })
        ));
        assert!(matches!(
            cache.get("k").await,
            Err(CacheError::Connection { .. })
        ));
        assert!(cache.get("k").await.is_ok());
    }
}
