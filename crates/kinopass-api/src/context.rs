// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kinopass_core::types::{RoleId, UserId};
use kinopass_core::Claims;

/// Authentication context for a request.
///
/// Attached as a request extension after the middleware validated the
/// access token. Carries the claims snapshot; handlers never re-read the
/// identity store for the facts embedded here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Validated access-token claims.
    pub claims: Claims,
    /// Request ID for tracing.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Creates a context from validated claims.
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            claims,
            request_id: Uuid::new_v4(),
        }
    }

    /// Returns the authenticated user id.
    pub fn user_id(&self) -> UserId {
        self.claims.sub
    }

    /// Returns the role snapshot, if any.
    pub fn role_id(&self) -> Option<RoleId> {
        self.claims.role_id
    }

    /// Returns `true` if the token carries the admin snapshot.
    pub fn is_admin(&self) -> bool {
        self.claims.is_admin
    }

    /// Returns `true` if the token carries the superuser flag.
    pub fn is_superuser(&self) -> bool {
        self.claims.is_superuser
    }
}

// =============================================================================
// Tests
// =============================================================================
