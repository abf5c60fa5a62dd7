// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API request handlers.

pub mod auth;
pub mod health;
pub mod oauth;
pub mod permissions;
pub mod roles;

pub use auth::{
    change_user_info, check_permission, login, login_history, logout, refresh_token,
    user_registration,
};
pub use health::{health, ready};
pub use oauth::{oauth_authorize_url, oauth_webhook};
pub use permissions::{attach_permission, create_permission, delete_permission, detach_permission};
pub use roles::{assign_role, create_role, delete_role, list_roles, unassign_role, update_role};
