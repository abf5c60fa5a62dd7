// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission catalog handlers. All require administrative privilege.

use axum::{extract::Path, extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use kinopass_core::types::{PermissionId, RoleId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::Auth;
use crate::state::AppState;

/// Permission create request body.
#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    /// Globally unique permission name.
    pub name: String,
}

/// POST /api/v1/permissions
///
/// Creates a permission. A taken name is a `409`.
pub async fn create_permission(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(request): Json<PermissionRequest>,
) -> ApiResult<impl IntoResponse> {
    state.guard.authorize_admin(&ctx.claims)?;

    if request.name.is_empty() {
        return Err(ApiError::validation("permission name is required"));
    }

    let permission = state.identity.create_permission(&request.name).await?;

    tracing::info!(permission_id = %permission.id, name = %permission.name, "permission created");
    Ok(Json(permission))
}

/// DELETE /api/v1/permissions/{permission_id}
///
/// Deletes a permission.
pub async fn delete_permission(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(permission_id): Path<PermissionId>,
) -> ApiResult<impl IntoResponse> {
    state.guard.authorize_admin(&ctx.claims)?;

    if !state.identity.delete_permission(permission_id).await? {
        return Err(ApiError::not_found("permission"));
    }

    tracing::info!(permission_id = %permission_id, "permission deleted");
    Ok(Json(true))
}

/// POST /api/v1/permissions/attach/{permission_id}/{role_id}
///
/// Attaches a permission to a role, moving it if attached elsewhere.
pub async fn attach_permission(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path((permission_id, role_id)): Path<(PermissionId, RoleId)>,
) -> ApiResult<impl IntoResponse> {
    state.guard.authorize_admin(&ctx.claims)?;

    if !state
        .identity
        .attach_permission(permission_id, role_id)
        .await?
    {
        return Err(ApiError::not_found("permission or role"));
    }

    Ok(Json(true))
}

/// POST /api/v1/permissions/detach/{permission_id}/{role_id}
///
/// Detaches a permission from the role it is currently attached to.
pub async fn detach_permission(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path((permission_id, role_id)): Path<(PermissionId, RoleId)>,
) -> ApiResult<impl IntoResponse> {
    state.guard.authorize_admin(&ctx.claims)?;

    let detached = state
        .identity
        .detach_permission(permission_id, role_id)
        .await?;

    Ok(Json(detached))
}
