// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access-token authentication and privilege checks.
//!
//! The guard gates every privileged operation. On the common path it trusts
//! the authorization facts snapshotted into the access token at issuance
//! (`is_admin`, `is_superuser`, role id) instead of re-reading the identity
//! store per request; the staleness window is bounded by the access-token
//! lifetime. Only role-reassignment checks and explicit permission queries
//! consult the store.

use std::sync::Arc;

use crate::error::{AuthError, AuthResult};
use crate::identity::IdentityStore;
use crate::revocation::{RevocationList, RevocationStore};
use crate::token::{Claims, TokenCodec, TokenKind};
use crate::types::UserId;

// =============================================================================
// AccessGuard
// =============================================================================

/// Validates access tokens and enforces privilege rules.
///
/// Role-change authorization follows a fixed table:
///
/// | caller \ target's role | non-admin or none | admin |
/// |------------------------|-------------------|-------|
/// | superuser              | allow             | allow |
/// | admin                  | allow             | deny  |
/// | other                  | deny              | deny  |
///
/// An admin may never grant or revoke a role on a user who currently holds
/// the admin role - themselves included - which closes the
/// privilege-escalation loop between admins.
pub struct AccessGuard {
    codec: Arc<TokenCodec>,
    revocation: Arc<RevocationStore>,
    identity: Arc<dyn IdentityStore>,
}

impl AccessGuard {
    /// Creates a new guard.
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

    /// Authenticates a raw access token.
    ///
    /// Decode failures surface as `Unauthorized`, except natural expiry
    /// which surfaces as `Expired` so the caller can run the refresh flow.
    /// The black-list read is fail-closed: if revocation state cannot be
    /// confirmed the token is rejected as `Unavailable`, never waved
    /// through.
    pub async fn authenticate(&self, raw_token: &str) -> AuthResult<Claims> {
        let claims = self.codec.decode(raw_token).map_err(AuthError::from)?;

        if claims.kind != TokenKind::Access {
            return Err(AuthError::unauthorized("invalid token type"));
        }

        if self
            .revocation
            .get(RevocationList::Black, claims.jti)
            .await?
            .is_some()
        {
            tracing::debug!(user_id = %claims.sub, jti = %claims.jti, "revoked access token presented");
            return Err(AuthError::unauthorized("session revoked"));
        }

        Ok(claims)
    }

    /// Requires administrative privilege: superuser or admin snapshot.
    pub fn authorize_admin(&self, claims: &Claims) -> AuthResult<()> {
        if claims.is_superuser || claims.is_admin {
            Ok(())
        } else {
            Err(AuthError::forbidden("this operation is forbidden for you"))
        }
    }

    /// Authorizes a role assignment or removal targeting `target`.
    ///
    /// Applies the role-change table above; the target's *current* role is
    /// read from the identity store, since the caller's token knows nothing
    /// about the target.
    pub async fn authorize_role_change(
        &self,
        claims: &Claims,
        target: UserId,
    ) -> AuthResult<()> {
        if claims.is_superuser {
            return Ok(());
        }
        if !claims.is_admin {
            return Err(AuthError::forbidden("this operation is forbidden for you"));
        }

        let target_user = self
            .identity
            .find_by_id(target)
            .await?
            .ok_or_else(|| AuthError::not_found("user"))?;

        if let Some(role_id) = target_user.role_id {
            if let Some(role) = self.identity.find_role(role_id).await? {
                if role.is_admin() {
                    tracing::warn!(
                        caller = %claims.sub,
                        target = %target,
                        "admin attempted role change on another admin"
                    );
                    return Err(AuthError::forbidden("this operation is forbidden for you"));
                }
            }
        }

        Ok(())
    }

    /// Returns whether the caller's current role grants a named permission.
    ///
    /// This check deliberately bypasses the token snapshot and reads the
    /// store: it answers "what may this user do right now".
    pub async fn check_permission(&self, claims: &Claims, permission: &str) -> AuthResult<bool> {
        let user = self
            .identity
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AuthError::unauthorized("user not found"))?;

        let Some(role_id) = user.role_id else {
            return Ok(false);
        };
        let Some(role) = self.identity.find_role_with_permissions(role_id).await? else {
            return Ok(false);
        };

        Ok(role.permissions.iter().any(|p| p.name == permission))
    }
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard").finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
