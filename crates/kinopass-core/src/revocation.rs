// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Revocation lists over the shared token cache.
//!
//! Two disjoint lists, keyed by token issuance id (`jti`):
//!
//! - **white-list**: presence means "this refresh token is currently valid
//!   and not yet consumed"
//! - **black-list**: presence means "this access token was explicitly
//!   invalidated before its natural expiry"
//!
//! A `jti` is written once (at issuance) and deleted once (at consumption),
//! so the cache needs no locking beyond its own atomic commands. Entry TTL
//! is bound to the lifetime of the token kind it tracks; an entry never
//! needs to outlive the token's own expiry.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::cache::TokenCache;
use crate::error::CacheError;
use crate::retry::{ExponentialBackoff, RetryConfig, RetryStrategy};

// =============================================================================
// RevocationList
// =============================================================================

/// The two revocation list kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationList {
    /// Valid, not-yet-consumed refresh tokens.
    White,
    /// Access tokens invalidated before natural expiry.
    Black,
}

impl RevocationList {
    /// Returns the list name used as the cache key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationList::White => "white_list",
            RevocationList::Black => "black_list",
        }
    }

    /// Builds the cache key for a token issuance id.
    pub fn key(&self, jti: Uuid) -> String {
        format!("{}:{}", self.as_str(), jti)
    }
}

impl std::fmt::Display for RevocationList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// RevocationStore
// =============================================================================

/// Cache-backed revocation state shared by all request workers.
///
/// Every operation runs under bounded exponential backoff; once retries are
/// exhausted the error surfaces to the call site, which decides between
/// fail-closed (authorization checks) and fail-open (best-effort cleanup).
pub struct RevocationStore {
    cache: Arc<dyn TokenCache>,
    retry: ExponentialBackoff,
}

impl RevocationStore {
    /// Creates a store over the given cache with the default retry policy.
    pub fn new(cache: Arc<dyn TokenCache>) -> Self {
        Self {
            cache,
            retry: ExponentialBackoff::default(),
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = ExponentialBackoff::new(config);
        self
    }

    /// Registers a token in a list.
    ///
    /// `ttl` must be the remaining validity of the token kind the list
    /// tracks: refresh lifetime for white entries, access lifetime for
    /// black entries.
    pub async fn put(
        &self,
        list: RevocationList,
        jti: Uuid,
        raw_token: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = list.key(jti);
        self.retry
            .execute(|| self.cache.set(&key, raw_token, ttl))
            .await?;

        tracing::debug!(list = %list, %jti, ttl_secs = ttl.as_secs(), "revocation entry stored");
        Ok(())
    }

    /// Returns the raw token stored under a list entry, or `None` if the
    /// entry is absent or expired.
    pub async fn get(
        &self,
        list: RevocationList,
        jti: Uuid,
    ) -> Result<Option<String>, CacheError> {
        let key = list.key(jti);
        self.retry.execute(|| self.cache.get(&key)).await
    }

    /// Removes a list entry. Removing an absent entry succeeds.
    pub async fn delete(&self, list: RevocationList, jti: Uuid) -> Result<(), CacheError> {
        let key = list.key(jti);
        self.retry.execute(|| self.cache.delete(&key)).await?;

        tracing::debug!(list = %list, %jti, "revocation entry removed");
        Ok(())
    }
}

impl std::fmt::Debug for RevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationStore").finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTokenCache;

    fn fast_retry() -> RetryConfig {
        RetryConfig::default()
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(1))
    }

    fn test_store() -> (Arc<MemoryTokenCache>, RevocationStore) {
        let cache = Arc::new(MemoryTokenCache::new());
        let store = RevocationStore::new(cache.clone()).with_retry(fast_retry());
        (cache, store)
    }

    #[test]
    fn test_list_keys_are_disjoint() {
        let jti = Uuid::new_v4();
        assert_eq!(
            RevocationList::White.key(jti),
            format!("white_list:{}", jti)
        );
        assert_eq!(
            RevocationList::Black.key(jti),
            format!("black_list:{}", jti)
        );
        assert_ne!(RevocationList::White.key(jti), RevocationList::Black.key(jti));
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let (_, store) = test_store();
        let jti = Uuid::new_v4();

        store
            .put(RevocationList::White, jti, "raw", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            store.get(RevocationList::White, jti).await.unwrap(),
            Some("raw".to_string())
        );
        // The same jti is absent from the other list.
        assert_eq!(store.get(RevocationList::Black, jti).await.unwrap(), None);

        store.delete(RevocationList::White, jti).await.unwrap();
        assert_eq!(store.get(RevocationList::White, jti).await.unwrap(), None);

        // Deleting again is a no-op.
        store.delete(RevocationList::White, jti).await.unwrap();
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (cache, store) = test_store();
        let jti = Uuid::new_v4();

        cache.fail_connections(2);
        store
            .put(RevocationList::Black, jti, "raw", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store
            .get(RevocationList::Black, jti)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface() {
        let (cache, store) = test_store();
        let jti = Uuid::new_v4();

        cache.fail_connections(10);
        let result = store.get(RevocationList::Black, jti).await;

        assert!(matches!(result, Err(CacheError::Connection { .. })));
    }
}
