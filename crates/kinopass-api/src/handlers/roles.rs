// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role catalog and role assignment handlers.
//!
//! Catalog CRUD requires administrative privilege. Assigning or removing a
//! role on a user additionally consults the role-change table: an admin may
//! never touch a user who currently holds the admin role; superusers may.

use axum::{extract::Path, extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use kinopass_core::types::{RoleId, UserId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::Auth;
use crate::state::AppState;

// =============================================================================
// Catalog CRUD
// =============================================================================

/// Role create/update request body.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    /// Role type name.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A user-role assignment as returned by the API.
#[derive(Debug, Serialize)]
pub struct UserRoleBody {
    /// The user.
    pub user_id: UserId,
    /// The assigned role.
    pub role_id: RoleId,
}

/// POST /api/v1/roles
///
/// Creates a role. A taken type name is a `409`.
pub async fn create_role(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(request): Json<RoleRequest>,
) -> ApiResult<impl IntoResponse> {
    state.guard.authorize_admin(&ctx.claims)?;

    if request.kind.is_empty() {
        return Err(ApiError::validation("role type is required"));
    }

    let role = state.identity.create_role(&request.kind).await?;

    tracing::info!(role_id = %role.id, kind = %role.kind, "role created");
    Ok(Json(role))
}

/// GET /api/v1/roles
///
/// Lists all roles with their permissions.
pub async fn list_roles(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    state.guard.authorize_admin(&ctx.claims)?;

    let roles = state.identity.list_roles().await?;
    Ok(Json(roles))
}

/// PUT /api/v1/roles/{role_id}
///
/// Renames a role.
pub async fn update_role(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(role_id): Path<RoleId>,
    Json(request): Json<RoleRequest>,
) -> ApiResult<impl IntoResponse> {
    state.guard.authorize_admin(&ctx.claims)?;

    let role = state
        .identity
        .update_role(role_id, &request.kind)
        .await?
        .ok_or_else(|| ApiError::not_found("role"))?;

    Ok(Json(role))
}

/// DELETE /api/v1/roles/{role_id}
///
/// Deletes a role, unassigning its users and detaching its permissions.
pub async fn delete_role(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(role_id): Path<RoleId>,
) -> ApiResult<impl IntoResponse> {
    state.guard.authorize_admin(&ctx.claims)?;

    if !state.identity.delete_role(role_id).await? {
        return Err(ApiError::not_found("role"));
    }

    tracing::info!(role_id = %role_id, "role deleted");
    Ok(Json(true))
}

// =============================================================================
// Role Assignment
// =============================================================================

/// POST /api/v1/roles/set/{user_id}/{role_id}
///
/// Assigns a role to a user, subject to the role-change table.
pub async fn assign_role(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path((user_id, role_id)): Path<(UserId, RoleId)>,
) -> ApiResult<impl IntoResponse> {
    state
        .guard
        .authorize_role_change(&ctx.claims, user_id)
        .await?;

    state
        .identity
        .assign_role(user_id, role_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user or role"))?;

    tracing::info!(caller = %ctx.user_id(), user_id = %user_id, role_id = %role_id, "role assigned");
    Ok(Json(UserRoleBody { user_id, role_id }))
}

/// POST /api/v1/roles/unset/{user_id}
///
/// Removes a user's role, subject to the role-change table.
pub async fn unassign_role(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(user_id): Path<UserId>,
) -> ApiResult<impl IntoResponse> {
    state
        .guard
        .authorize_role_change(&ctx.claims, user_id)
        .await?;

    if !state.identity.unassign_role(user_id).await? {
        return Err(ApiError::not_found("user"));
    }

    tracing::info!(caller = %ctx.user_id(), user_id = %user_id, "role removed");
    Ok(Json(true))
}
