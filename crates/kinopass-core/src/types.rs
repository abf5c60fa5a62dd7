// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core identity types: users, roles, permissions, login events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identifier.
pub type UserId = Uuid;
/// Role identifier.
pub type RoleId = Uuid;
/// Permission identifier.
pub type PermissionId = Uuid;

/// Role type that grants administrative privileges.
pub const ADMIN_ROLE: &str = "admin";

/// Role type assigned to freshly registered users.
pub const DEFAULT_ROLE: &str = "user";

// =============================================================================
// User
// =============================================================================

/// A platform user.
///
/// Users are never physically deleted; deactivation flips `active` off.
/// A user holds at most one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Unique login email.
    pub email: String,
    /// Argon2 password hash (PHC string). Never the raw password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Whether the account may log in.
    pub active: bool,
    /// Unconditional privilege bypass flag.
    pub is_superuser: bool,
    /// The user's role, if any.
    pub role_id: Option<RoleId>,
}

/// Fields for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login email.
    pub email: String,
    /// Argon2 password hash. Callers hash before handing off.
    pub password_hash: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Superuser flag; only set by bootstrap paths.
    pub is_superuser: bool,
}

/// Partial update of a user's own profile.
///
/// `None` fields are left unchanged. Email and password in particular are
/// only touched when explicitly provided.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New email, if changing.
    pub email: Option<String>,
    /// New Argon2 password hash, if changing.
    pub password_hash: Option<String>,
    /// New given name, if changing.
    pub first_name: Option<String>,
    /// New family name, if changing.
    pub last_name: Option<String>,
}

// =============================================================================
// Role & Permission
// =============================================================================

/// A role. Role types are globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier.
    pub id: RoleId,
    /// Unique role type name (`admin`, `user`, ...).
    #[serde(rename = "type")]
    pub kind: String,
}

impl Role {
    /// Returns `true` if this is the administrative role.
    pub fn is_admin(&self) -> bool {
        self.kind == ADMIN_ROLE
    }
}

/// A named permission. A permission belongs to at most one role at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique identifier.
    pub id: PermissionId,
    /// Globally unique permission name.
    pub name: String,
    /// The role this permission is attached to, if any.
    pub role_id: Option<RoleId>,
}

/// A role together with its attached permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleWithPermissions {
    /// Unique identifier.
    pub id: RoleId,
    /// Unique role type name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Permissions attached to this role.
    pub permissions: Vec<Permission>,
}

// =============================================================================
// Login Event
// =============================================================================

/// One successful authentication, recorded for the login-history view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEvent {
    /// Unique identifier.
    pub id: Uuid,
    /// The user who logged in.
    pub user_id: UserId,
    /// Client user agent (or an `oauth:<provider>` marker).
    pub user_agent: String,
    /// When the login happened.
    pub date_auth: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_is_admin() {
        let admin = Role {
            id: Uuid::new_v4(),
            kind: ADMIN_ROLE.to_string(),
        };
        let user = Role {
            id: Uuid::new_v4(),
            kind: DEFAULT_ROLE.to_string(),
        };

        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
            active: true,
            is_superuser: false,
            role_id: None,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("a@x.com"));
    }

    #[test]
    fn test_role_serializes_kind_as_type() {
        let role = Role {
            id: Uuid::new_v4(),
            kind: "guest".to_string(),
        };

        let json = serde_json::to_string(&role).unwrap();
        assert!(json.contains("\"type\":\"guest\""));
    }
}
