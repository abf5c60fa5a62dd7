// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session lifecycle: issuance, refresh rotation, logout.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::identity::IdentityStore;
use crate::password;
use crate::revocation::{RevocationList, RevocationStore};
use crate::token::{Claims, TokenCodec, TokenKind};
use crate::types::User;

/// Floor for the black-list TTL when a token is close to (or past) expiry.
const BLACKLIST_TTL_FLOOR: Duration = Duration::from_secs(30);

// =============================================================================
// TokenPair
// =============================================================================

/// An access/refresh token pair handed to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Token scheme.
    pub token_type: String,
}

impl TokenPair {
    /// Creates a bearer token pair.
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
        }
    }
}

// =============================================================================
// SessionManager
// =============================================================================

/// Issues, rotates, and revokes session token pairs.
///
/// All collaborators are injected; coordination across request workers
/// happens exclusively through the shared revocation cache.
pub struct SessionManager {
    codec: Arc<TokenCodec>,
    revocation: Arc<RevocationStore>,
    identity: Arc<dyn IdentityStore>,
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        codec: Arc<TokenCodec>,
        revocation: Arc<RevocationStore>,
        identity: Arc<dyn IdentityStore>,
    ) -> Self {
        Self {
            codec,
            revocation,
            identity,
        }
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Validates credentials and issues a fresh token pair.
    ///
    /// Fails with `NotFound` for an unknown email, `Forbidden` for a wrong
    /// password or a deactivated account.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: Option<&str>,
    ) -> AuthResult<(TokenPair, User)> {
        let user = self
            .identity
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::not_found("user"))?;

        if !password::verify_password(password, &user.password_hash) {
            return Err(AuthError::forbidden("incorrect password"));
        }
        if !user.active {
            return Err(AuthError::forbidden("user is deactivated"));
        }

        let pair = self.issue_pair(&user).await?;

        if let Some(agent) = user_agent {
            // History is informational; a store hiccup must not fail a login
            // that already issued valid tokens.
            if let Err(e) = self.identity.record_login(user.id, agent).await {
                tracing::warn!(user_id = %user.id, error = %e, "failed to record login event");
            }
        }

        tracing::info!(user_id = %user.id, "user logged in");
        Ok((pair, user))
    }

    /// Issues a token pair for an already-validated identity.
    ///
    /// Access claims snapshot the user's role and flags as of now; the
    /// refresh token's `jti` is registered in the white-list for the full
    /// refresh lifetime.
    pub async fn issue_pair(&self, user: &User) -> AuthResult<TokenPair> {
        let role_kind = match user.role_id {
            Some(role_id) => self
                .identity
                .find_role(role_id)
                .await?
                .map(|role| role.kind),
            None => None,
        };

        let access = Claims::access(user, role_kind.as_deref(), self.codec.access_ttl());
        let refresh = Claims::refresh(user, self.codec.refresh_ttl());

        let access_token = self.codec.encode(&access)?;
        let refresh_token = self.codec.encode(&refresh)?;

        self.revocation
            .put(
                RevocationList::White,
                refresh.jti,
                &refresh_token,
                self.codec.refresh_ttl(),
            )
            .await?;

        tracing::debug!(user_id = %user.id, access_jti = %access.jti, refresh_jti = %refresh.jti, "issued token pair");
        Ok(TokenPair::bearer(access_token, refresh_token))
    }

    /// Rotates a token pair.
    ///
    /// The refresh token must decode, be of kind `refresh`, and still be
    /// present in the white-list; a replayed (already-consumed) refresh
    /// token fails with `Forbidden`. The white-list entry is deleted
    /// *before* the new pair is issued so a concurrent duplicate request
    /// sees the entry gone and is rejected rather than racing to a second
    /// valid pair. Current role and superuser flags are re-read from the
    /// identity store.
    pub async fn refresh(&self, access_token: &str, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.codec.decode(refresh_token).map_err(AuthError::from)?;

        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::unauthorized("invalid token type"));
        }

        if self
            .revocation
            .get(RevocationList::White, claims.jti)
            .await?
            .is_none()
        {
            tracing::warn!(user_id = %claims.sub, jti = %claims.jti, "refresh token replayed or revoked");
            return Err(AuthError::forbidden("incorrect token"));
        }

        // Consume before issuing: delete-then-issue keeps a duplicate
        // request racing toward rejection, never toward double-issuance.
        self.revocation
            .delete(RevocationList::White, claims.jti)
            .await?;

        let user = self
            .identity
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AuthError::unauthorized("unknown session subject"))?;

        let pair = self.issue_pair(&user).await?;

        // The old access token may be used no further, even though it has
        // not yet expired naturally.
        self.blacklist_access(access_token).await;

        tracing::info!(user_id = %user.id, "token pair rotated");
        Ok(pair)
    }

    /// Terminates a session.
    ///
    /// Black-lists the access token (best effort) and removes the refresh
    /// token from the white-list. Idempotent: repeating logout with the
    /// same tokens is a no-op once the entries are gone.
    pub async fn logout(&self, access_token: &str, refresh_token: &str) -> AuthResult<()> {
        self.blacklist_access(access_token).await;

        match self.codec.decode_allow_expired(refresh_token) {
            Ok(claims) if claims.kind == TokenKind::Refresh => {
                self.revocation
                    .delete(RevocationList::White, claims.jti)
                    .await?;
                tracing::info!(user_id = %claims.sub, "user logged out");
            }
            Ok(_) | Err(_) => {
                tracing::debug!("logout presented an undecodable refresh token");
            }
        }

        Ok(())
    }

    /// Black-lists an access token by `jti`, best effort.
    ///
    /// TTL is the token's remaining validity, floored so that a token right
    /// at the edge of expiry still lands on the list. Undecodable or
    /// non-access tokens are skipped.
    async fn blacklist_access(&self, access_token: &str) {
        let claims = match self.codec.decode_allow_expired(access_token) {
            Ok(claims) if claims.kind == TokenKind::Access => claims,
            Ok(_) | Err(_) => return,
        };

        let ttl = claims.remaining().max(BLACKLIST_TTL_FLOOR);

        if let Err(e) = self
            .revocation
            .put(RevocationList::Black, claims.jti, access_token, ttl)
            .await
        {
            tracing::warn!(jti = %claims.jti, error = %e, "failed to black-list access token");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTokenCache;
    use crate::identity::MemoryIdentityStore;
    use crate::retry::RetryConfig;
    use crate::token::TokenConfig;
    use crate::types::NewUser;

    struct Fixture {
        sessions: SessionManager,
        codec: Arc<TokenCodec>,
        revocation: Arc<RevocationStore>,
        identity: Arc<MemoryIdentityStore>,
    }

    async fn fixture() -> Fixture {
        let codec = Arc::new(
            TokenCodec::new(
                TokenConfig::new("test-secret-key-that-is-long-enough-for-testing")
                    .with_access_ttl(Duration::from_secs(1200))
                    .with_refresh_ttl(Duration::from_secs(3600)),
            )
            .unwrap(),
        );
        let revocation = Arc::new(
            RevocationStore::new(Arc::new(MemoryTokenCache::new())).with_retry(
                RetryConfig::default()
                    .with_max_attempts(2)
                    .with_initial_delay(Duration::from_millis(1)),
            ),
        );
        let identity = Arc::new(MemoryIdentityStore::new());

        Fixture {
            sessions: SessionManager::new(codec.clone(), revocation.clone(), identity.clone()),
            codec,
            revocation,
            identity,
        }
    }

    async fn seed_user(identity: &MemoryIdentityStore, email: &str, password: &str) -> User {
        identity
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: password::hash_password(password).unwrap(),
                first_name: None,
                last_name: None,
                is_superuser: false,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let fx = fixture().await;

        let err = fx.sessions.login("a@x.com", "p1", None).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let fx = fixture().await;
        seed_user(&fx.identity, "a@x.com", "p1").await;

        let err = fx
            .sessions
            .login("a@x.com", "wrong", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_login_deactivated_user() {
        let fx = fixture().await;
        let user = seed_user(&fx.identity, "a@x.com", "p1").await;
        fx.identity.set_active(user.id, false).await.unwrap();

        let err = fx.sessions.login("a@x.com", "p1", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_login_issues_whitelisted_pair() {
        let fx = fixture().await;
        seed_user(&fx.identity, "a@x.com", "p1").await;

        let (pair, user) = fx
            .sessions
            .login("a@x.com", "p1", Some("test-agent"))
            .await
            .unwrap();

        let access = fx.codec.decode(&pair.access_token).unwrap();
        let refresh = fx.codec.decode(&pair.refresh_token).unwrap();

        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(access.sub, user.id);
        assert_eq!(access.lifetime(), Duration::from_secs(1200));
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert_eq!(refresh.lifetime(), Duration::from_secs(3600));

        // The refresh jti is registered in the white-list.
        assert!(fx
            .revocation
            .get(RevocationList::White, refresh.jti)
            .await
            .unwrap()
            .is_some());

        // Login history recorded.
        let history = fx
            .identity
            .login_history(user.id, 10, 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_agent, "test-agent");
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_prevents_replay() {
        let fx = fixture().await;
        seed_user(&fx.identity, "a@x.com", "p1").await;

        let (pair, _) = fx.sessions.login("a@x.com", "p1", None).await.unwrap();

        let rotated = fx
            .sessions
            .refresh(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap();

        assert_ne!(rotated.access_token, pair.access_token);
        assert_ne!(rotated.refresh_token, pair.refresh_token);

        // The original refresh token was consumed by the rotation.
        let err = fx
            .sessions
            .refresh(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));

        // The old access token is black-listed.
        let old_access = fx.codec.decode(&pair.access_token).unwrap();
        assert!(fx
            .revocation
            .get(RevocationList::Black, old_access.jti)
            .await
            .unwrap()
            .is_some());

        // The new refresh token rotates fine.
        assert!(fx
            .sessions
            .refresh(&rotated.access_token, &rotated.refresh_token)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let fx = fixture().await;
        seed_user(&fx.identity, "a@x.com", "p1").await;

        let (pair, _) = fx.sessions.login("a@x.com", "p1", None).await.unwrap();

        // Presenting the access token where the refresh token belongs.
        let err = fx
            .sessions
            .refresh(&pair.access_token, &pair.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_refresh_rereads_current_role() {
        let fx = fixture().await;
        let user = seed_user(&fx.identity, "a@x.com", "p1").await;

        let (pair, _) = fx.sessions.login("a@x.com", "p1", None).await.unwrap();
        let access = fx.codec.decode(&pair.access_token).unwrap();
        assert!(!access.is_admin);

        // Promote after issuance; the old snapshot stays stale, the rotated
        // one picks up the new role.
        let admin_role = fx.identity.create_role("admin").await.unwrap();
        fx.identity.assign_role(user.id, admin_role.id).await.unwrap();

        let rotated = fx
            .sessions
            .refresh(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap();
        let rotated_access = fx.codec.decode(&rotated.access_token).unwrap();

        assert!(rotated_access.is_admin);
        assert_eq!(rotated_access.role_id, Some(admin_role.id));
    }

    #[tokio::test]
    async fn test_logout_revokes_both_tokens() {
        let fx = fixture().await;
        seed_user(&fx.identity, "a@x.com", "p1").await;

        let (pair, _) = fx.sessions.login("a@x.com", "p1", None).await.unwrap();
        let access = fx.codec.decode(&pair.access_token).unwrap();
        let refresh = fx.codec.decode(&pair.refresh_token).unwrap();

        fx.sessions
            .logout(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap();

        assert!(fx
            .revocation
            .get(RevocationList::Black, access.jti)
            .await
            .unwrap()
            .is_some());
        assert!(fx
            .revocation
            .get(RevocationList::White, refresh.jti)
            .await
            .unwrap()
            .is_none());

        // The consumed refresh token can no longer rotate.
        let err = fx
            .sessions
            .refresh(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));

        // Logout is idempotent.
        assert!(fx
            .sessions
            .logout(&pair.access_token, &pair.refresh_token)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_refresh_unavailable_when_whitelist_unreachable() {
        let fx = fixture().await;
        seed_user(&fx.identity, "a@x.com", "p1").await;
        let (pair, _) = fx.sessions.login("a@x.com", "p1", None).await.unwrap();

        // Reach the cache through the fixture's own handle to inject failures.
        let cache = Arc::new(MemoryTokenCache::new());
        cache.fail_connections(10);
        let revocation = Arc::new(RevocationStore::new(cache).with_retry(
            RetryConfig::default()
                .with_max_attempts(2)
                .with_initial_delay(Duration::from_millis(1)),
        ));
        let sessions =
            SessionManager::new(fx.codec.clone(), revocation, fx.identity.clone());

        let err = sessions
            .refresh(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unavailable { .. }));
    }
}
