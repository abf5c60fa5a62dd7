// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The external identity store interface.
//!
//! The durable users/roles/permissions relation is an external collaborator;
//! this module defines the trait the auth core consumes plus an in-memory
//! realization for tests and development. Implementations are responsible
//! for their own transient-failure retries; the in-memory store never fails
//! transiently.
//!
//! Invariants enforced by every implementation:
//! - emails, role types, and permission names are globally unique
//! - a user holds at most one role
//! - a permission is attached to at most one role at a time

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{
    LoginEvent, NewUser, Permission, PermissionId, Role, RoleId, RoleWithPermissions, User,
    UserId, UserUpdate,
};

// =============================================================================
// IdentityStore Trait
// =============================================================================

/// Durable users/roles/permissions storage consumed by the auth core.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Looks a user up by unique email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks a user up by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Creates a user. Fails with `Conflict` on a duplicate email.
    async fn create_user(&self, fields: NewUser) -> Result<User, StoreError>;

    /// Applies a partial update to a user. Returns `None` for an unknown id;
    /// fails with `Conflict` when a new email is already taken.
    async fn update_user(&self, id: UserId, update: UserUpdate)
        -> Result<Option<User>, StoreError>;

    /// Activates or deactivates an account. Users are never deleted;
    /// deactivation is the only removal. Returns `false` for an unknown id.
    async fn set_active(&self, user_id: UserId, active: bool) -> Result<bool, StoreError>;

    /// Assigns a role to a user. Returns `None` if either is unknown.
    async fn assign_role(&self, user_id: UserId, role_id: RoleId)
        -> Result<Option<User>, StoreError>;

    /// Removes a user's role. Returns `false` for an unknown user.
    async fn unassign_role(&self, user_id: UserId) -> Result<bool, StoreError>;

    /// Looks a role up by id.
    async fn find_role(&self, role_id: RoleId) -> Result<Option<Role>, StoreError>;

    /// Looks a role up by id, including its attached permissions.
    async fn find_role_with_permissions(
        &self,
        role_id: RoleId,
    ) -> Result<Option<RoleWithPermissions>, StoreError>;

    /// Creates a role. Fails with `Conflict` on a duplicate type name.
    async fn create_role(&self, kind: &str) -> Result<Role, StoreError>;

    /// Renames a role. Returns `None` for an unknown id; fails with
    /// `Conflict` when the new type name is already taken.
    async fn update_role(&self, role_id: RoleId, kind: &str) -> Result<Option<Role>, StoreError>;

    /// Deletes a role, detaching its permissions and unassigning its users.
    /// Returns `false` for an unknown id.
    async fn delete_role(&self, role_id: RoleId) -> Result<bool, StoreError>;

    /// Lists all roles with their permissions.
    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, StoreError>;

    /// Creates a permission. Fails with `Conflict` on a duplicate name.
    async fn create_permission(&self, name: &str) -> Result<Permission, StoreError>;

    /// Deletes a permission. Returns `false` for an unknown id.
    async fn delete_permission(&self, id: PermissionId) -> Result<bool, StoreError>;

    /// Attaches a permission to a role, moving it if it was attached
    /// elsewhere. Returns `false` if either is unknown.
    async fn attach_permission(
        &self,
        permission_id: PermissionId,
        role_id: RoleId,
    ) -> Result<bool, StoreError>;

    /// Detaches a permission from a role. Returns `false` if the permission
    /// is not currently attached to that role.
    async fn detach_permission(
        &self,
        permission_id: PermissionId,
        role_id: RoleId,
    ) -> Result<bool, StoreError>;

    /// Records a successful login for the history view.
    async fn record_login(&self, user_id: UserId, user_agent: &str) -> Result<(), StoreError>;

    /// Returns a page of a user's login history, newest first, or `None`
    /// for an unknown user.
    async fn login_history(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Option<Vec<LoginEvent>>, StoreError>;
}

// =============================================================================
// Memory Identity Store
// =============================================================================

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, Permission>,
    logins: Vec<LoginEvent>,
}

/// An in-memory identity store for tests and development.
///
/// Enforces the same uniqueness and at-most-one-role invariants a relational
/// realization enforces through constraints.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    inner: RwLock<Inner>,
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn create_user(&self, fields: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write();

        if inner.users.values().any(|u| u.email == fields.email) {
            return Err(StoreError::Conflict { field: "email" });
        }

        let user = User {
            id: Uuid::new_v4(),
            email: fields.email,
            password_hash: fields.password_hash,
            first_name: fields.first_name,
            last_name: fields.last_name,
            created_at: Utc::now(),
            active: true,
            is_superuser: fields.is_superuser,
            role_id: None,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write();

        if let Some(new_email) = &update.email {
            if inner
                .users
                .values()
                .any(|u| u.id != id && u.email == *new_email)
            {
                return Err(StoreError::Conflict { field: "email" });
            }
        }

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            user.last_name = Some(last_name);
        }

        Ok(Some(user.clone()))
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();

        let Some(user) = inner.users.get_mut(&user_id) else {
            return Ok(false);
        };
        user.active = active;
        Ok(true)
    }

    async fn assign_role(
        &self,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write();

        if !inner.roles.contains_key(&role_id) {
            return Ok(None);
        }
        let Some(user) = inner.users.get_mut(&user_id) else {
            return Ok(None);
        };

        user.role_id = Some(role_id);
        Ok(Some(user.clone()))
    }

    async fn unassign_role(&self, user_id: UserId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();

        let Some(user) = inner.users.get_mut(&user_id) else {
            return Ok(false);
        };
        user.role_id = None;
        Ok(true)
    }

    async fn find_role(&self, role_id: RoleId) -> Result<Option<Role>, StoreError> {
        Ok(self.inner.read().roles.get(&role_id).cloned())
    }

    async fn find_role_with_permissions(
        &self,
        role_id: RoleId,
    ) -> Result<Option<RoleWithPermissions>, StoreError> {
        let inner = self.inner.read();

        let Some(role) = inner.roles.get(&role_id) else {
            return Ok(None);
        };

        let permissions = inner
            .permissions
            .values()
            .filter(|p| p.role_id == Some(role_id))
            .cloned()
            .collect();

        Ok(Some(RoleWithPermissions {
            id: role.id,
            kind: role.kind.clone(),
            permissions,
        }))
    }

    async fn create_role(&self, kind: &str) -> Result<Role, StoreError> {
        let mut inner = self.inner.write();

        if inner.roles.values().any(|r| r.kind == kind) {
            return Err(StoreError::Conflict { field: "role type" });
        }

        let role = Role {
            id: Uuid::new_v4(),
            kind: kind.to_string(),
        };
        inner.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, role_id: RoleId, kind: &str) -> Result<Option<Role>, StoreError> {
        let mut inner = self.inner.write();

        if inner
            .roles
            .values()
            .any(|r| r.id != role_id && r.kind == kind)
        {
            return Err(StoreError::Conflict { field: "role type" });
        }

        let Some(role) = inner.roles.get_mut(&role_id) else {
            return Ok(None);
        };
        role.kind = kind.to_string();
        Ok(Some(role.clone()))
    }

    async fn delete_role(&self, role_id: RoleId) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();

        if inner.roles.remove(&role_id).is_none() {
            return Ok(false);
        }

        for user in inner.users.values_mut() {
            if user.role_id == Some(role_id) {
                user.role_id = None;
            }
        }
        for permission in inner.permissions.values_mut() {
            if permission.role_id == Some(role_id) {
                permission.role_id = None;
            }
        }
        Ok(true)
    }

    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, StoreError> {
        let inner = self.inner.read();

        let mut roles: Vec<RoleWithPermissions> = inner
            .roles
            .values()
            .map(|role| RoleWithPermissions {
                id: role.id,
                kind: role.kind.clone(),
                permissions: inner
                    .permissions
                    .values()
                    .filter(|p| p.role_id == Some(role.id))
                    .cloned()
                    .collect(),
            })
            .collect();

        roles.sort_by(|a, b| a.kind.cmp(&b.kind));
        Ok(roles)
    }

    async fn create_permission(&self, name: &str) -> Result<Permission, StoreError> {
        let mut inner = self.inner.write();

        if inner.permissions.values().any(|p| p.name == name) {
            return Err(StoreError::Conflict {
                field: "permission name",
            });
        }

        let permission = Permission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            role_id: None,
        };
        inner.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    async fn delete_permission(&self, id: PermissionId) -> Result<bool, StoreError> {
        Ok(self.inner.write().permissions.remove(&id).is_some())
    }

    async fn attach_permission(
        &self,
        permission_id: PermissionId,
        role_id: RoleId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();

        if !inner.roles.contains_key(&role_id) {
            return Ok(false);
        }
        let Some(permission) = inner.permissions.get_mut(&permission_id) else {
            return Ok(false);
        };

        // Attaching moves the permission; it belongs to at most one role.
        permission.role_id = Some(role_id);
        Ok(true)
    }

    async fn detach_permission(
        &self,
        permission_id: PermissionId,
        role_id: RoleId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write();

        let Some(permission) = inner.permissions.get_mut(&permission_id) else {
            return Ok(false);
        };
        if permission.role_id != Some(role_id) {
            return Ok(false);
        }
        permission.role_id = None;
        Ok(true)
    }

    async fn record_login(&self, user_id: UserId, user_agent: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write();

        let event = LoginEvent {
            id: Uuid::new_v4(),
            user_id,
            user_agent: user_agent.to_string(),
            date_auth: Utc::now(),
        };
        inner.logins.push(event);
        Ok(())
    }

    async fn login_history(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Option<Vec<LoginEvent>>, StoreError> {
        let inner = self.inner.read();

        if !inner.users.contains_key(&user_id) {
            return Ok(None);
        }

        let events = inner
            .logins
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(Some(events))
    }
}

// =============================================================================
// Tests
// =============================================================================
