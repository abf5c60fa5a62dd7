// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::Arc;

use kinopass_core::cache::{MemoryTokenCache, TokenCache};
use kinopass_core::identity::{IdentityStore, MemoryIdentityStore};
use kinopass_core::oauth::OAuthProvider;
use kinopass_core::{AccessGuard, RevocationStore, SessionManager, TokenCodec};

use crate::config::ApiConfig;
use crate::error::ApiResult;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// All collaborators are injected at construction; request workers are
/// stateless and coordinate only through the shared revocation cache.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Token codec.
    pub codec: Arc<TokenCodec>,
    /// Session lifecycle manager.
    pub sessions: Arc<SessionManager>,
    /// Access-token guard.
    pub guard: Arc<AccessGuard>,
    /// Identity store.
    pub identity: Arc<dyn IdentityStore>,
    /// OAuth providers by name.
    pub oauth: Arc<HashMap<String, Arc<dyn OAuthProvider>>>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing [`AppState`].
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    cache: Option<Arc<dyn TokenCache>>,
    identity: Option<Arc<dyn IdentityStore>>,
    oauth: Vec<Arc<dyn OAuthProvider>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            cache: None,
            identity: None,
            oauth: Vec::new(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the revocation cache backend.
    pub fn cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the identity store.
    pub fn identity(mut self, identity: Arc<dyn IdentityStore>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Registers an OAuth provider.
    pub fn oauth_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.oauth.push(provider);
        self
    }

    /// Builds the state, wiring the session manager and guard over the
    /// shared codec, revocation store, and identity store.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let codec = Arc::new(TokenCodec::new(config.token.clone())?);

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryTokenCache::new()));
        let revocation =
            Arc::new(RevocationStore::new(cache).with_retry(config.cache.retry.clone()));

        let identity = self
            .identity
            .unwrap_or_else(|| Arc::new(MemoryIdentityStore::new()));

        let sessions = Arc::new(SessionManager::new(
            codec.clone(),
            revocation.clone(),
            identity.clone(),
        ));
        let guard = Arc::new(AccessGuard::new(
            codec.clone(),
            revocation,
            identity.clone(),
        ));

        let oauth = self
            .oauth
            .into_iter()
            .map(|provider| (provider.name().to_string(), provider))
            .collect();

        Ok(AppState {
            config: Arc::new(config),
            codec,
            sessions,
            guard,
            identity,
            oauth: Arc::new(oauth),
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kinopass_core::TokenConfig;

    #[test]
    fn test_builder_defaults_to_memory_backends() {
        let config = ApiConfig::default()
            .with_token(TokenConfig::new("test-secret-key-that-is-long-enough-xx"));

        let state = AppState::builder().config(config).build().unwrap();

        assert!(state.oauth.is_empty());
        assert_eq!(state.config.base_path, "/api/v1");
    }

    #[test]
    fn test_builder_requires_secret() {
        // Default config carries no token secret.
        assert!(AppState::builder().build().is_err());
    }
}
