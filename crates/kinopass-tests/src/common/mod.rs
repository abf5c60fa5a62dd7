// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Shared Test Fixtures
//!
//! Builders for assembling the auth stack against in-memory backends, with
//! seeded users covering the privilege spectrum.

use std::sync::Arc;
use std::time::Duration;

use kinopass_core::cache::MemoryTokenCache;
use kinopass_core::identity::{IdentityStore, MemoryIdentityStore};
use kinopass_core::password;
use kinopass_core::retry::RetryConfig;
use kinopass_core::types::{NewUser, User, ADMIN_ROLE, DEFAULT_ROLE};
use kinopass_core::{AccessGuard, RevocationStore, SessionManager, TokenCodec, TokenConfig};

/// Password shared by every seeded user.
pub const TEST_PASSWORD: &str = "p1-test-password";

/// Signing secret used by test codecs.
pub const TEST_SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

// =============================================================================
// Auth Stack
// =============================================================================

/// A fully wired auth core over in-memory backends.
pub struct AuthStack {
    /// Token codec.
    pub codec: Arc<TokenCodec>,
    /// The cache backing the revocation lists.
    pub cache: Arc<MemoryTokenCache>,
    /// Revocation store.
    pub revocation: Arc<RevocationStore>,
    /// Identity store.
    pub identity: Arc<MemoryIdentityStore>,
    /// Session manager.
    pub sessions: Arc<SessionManager>,
    /// Access guard.
    pub guard: Arc<AccessGuard>,
}

/// Builds an auth stack with the given token lifetimes.
///
/// Leeway is zero so expiry tests do not have to outwait clock-skew
/// tolerance; retries are short so failure-injection tests stay fast.
pub fn auth_stack(access_ttl: Duration, refresh_ttl: Duration) -> AuthStack {
    let codec = Arc::new(
        TokenCodec::new(TokenConfig {
            leeway_secs: 0,
            ..TokenConfig::new(TEST_SECRET)
                .with_access_ttl(access_ttl)
                .with_refresh_ttl(refresh_ttl)
        })
        .expect("test codec"),
    );

    let cache = Arc::new(MemoryTokenCache::new());
    let revocation = Arc::new(
        RevocationStore::new(cache.clone()).with_retry(
            RetryConfig::default()
                .with_max_attempts(2)
                .with_initial_delay(Duration::from_millis(1)),
        ),
    );
    let identity = Arc::new(MemoryIdentityStore::new());

    let sessions = Arc::new(SessionManager::new(
        codec.clone(),
        revocation.clone(),
        identity.clone(),
    ));
    let guard = Arc::new(AccessGuard::new(
        codec.clone(),
        revocation.clone(),
        identity.clone(),
    ));

    AuthStack {
        codec,
        cache,
        revocation,
        identity,
        sessions,
        guard,
    }
}

/// Builds an auth stack with comfortable lifetimes.
pub fn default_auth_stack() -> AuthStack {
    auth_stack(Duration::from_secs(1200), Duration::from_secs(3600))
}

// =============================================================================
// Seeding
// =============================================================================

impl AuthStack {
    /// Seeds the `admin` and `user` roles.
    pub async fn seed_roles(&self) {
        self.identity.create_role(ADMIN_ROLE).await.expect("admin role");
        self.identity
            .create_role(DEFAULT_ROLE)
            .await
            .expect("user role");
    }

    /// Seeds a user with [`TEST_PASSWORD`].
    pub async fn seed_user(&self, email: &str, is_superuser: bool) -> User {
        self.identity
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: password::hash_password(TEST_PASSWORD).expect("hash"),
                first_name: None,
                last_name: None,
                is_superuser,
            })
            .await
            .expect("seed user")
    }

    /// Seeds a user holding the `admin` role. Requires [`seed_roles`].
    ///
    /// [`seed_roles`]: AuthStack::seed_roles
    pub async fn seed_admin(&self, email: &str) -> User {
        let user = self.seed_user(email, false).await;
        let roles = self.identity.list_roles().await.expect("roles");
        let admin = roles
            .into_iter()
            .find(|r| r.kind == ADMIN_ROLE)
            .expect("admin role seeded");

        self.identity
            .assign_role(user.id, admin.id)
            .await
            .expect("assign")
            .expect("user and role exist")
    }
}
