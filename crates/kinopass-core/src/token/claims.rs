// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token claims.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{RoleId, User, UserId, ADMIN_ROLE};

// =============================================================================
// TokenKind
// =============================================================================

/// The two kinds of session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential presented on every request.
    Access,
    /// Long-lived credential exchanged for a fresh pair.
    Refresh,
}

impl TokenKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Claims
// =============================================================================

/// The claim set embedded in a session token.
///
/// Claims are immutable once issued; a token is never mutated, only
/// superseded by a fresh pair. Access tokens snapshot the authorization
/// facts (`role_id`, `is_admin`, `is_superuser`) as they stood at issuance
/// time and are trusted until natural expiry or explicit revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user this token belongs to.
    pub sub: UserId,

    /// Token kind (`access` or `refresh`).
    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Unique issuance identifier. Revocation lists are keyed by this.
    pub jti: Uuid,

    /// Issued-at time (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// The subject's role at issuance time. Access tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,

    /// Whether the subject held the admin role at issuance time.
    #[serde(default)]
    pub is_admin: bool,

    /// Whether the subject was a superuser at issuance time.
    #[serde(default)]
    pub is_superuser: bool,
}

impl Claims {
    /// Creates access-token claims for a user.
    ///
    /// `role_kind` is the type name of the user's current role, used to
    /// snapshot the `is_admin` fact.
    pub fn access(user: &User, role_kind: Option<&str>, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: user.id,
            kind: TokenKind::Access,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
            role_id: user.role_id,
            is_admin: role_kind == Some(ADMIN_ROLE),
            is_superuser: user.is_superuser,
        }
    }

    /// Creates refresh-token claims for a user.
    ///
    /// Refresh tokens carry no authorization snapshot; rotation re-reads
    /// the identity store for current facts.
    pub fn refresh(user: &User, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: user.id,
            kind: TokenKind::Refresh,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
            role_id: None,
            is_admin: false,
            is_superuser: false,
        }
    }

    /// Returns `true` if the token is past its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the remaining validity, or zero if already expired.
    pub fn remaining(&self) -> Duration {
        let now = Utc::now().timestamp();
        Duration::from_secs(self.exp.saturating_sub(now).max(0) as u64)
    }

    /// Returns the total lifetime this token was issued with.
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.exp.saturating_sub(self.iat).max(0) as u64)
    }
}

// =============================================================================
// Tests
// =============================================================================
