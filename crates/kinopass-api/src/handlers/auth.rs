// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers: login, registration, refresh, logout, profile.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kinopass_core::password;
use kinopass_core::types::{NewUser, UserId, UserUpdate};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, Pagination, SessionCookies};
use crate::response::{clear_session_response, session_response};
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// POST /api/v1/users/login
///
/// Validates credentials and establishes a session: issues a token pair and
/// sets the `access_token` / `refresh_token` cookies.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());

    let (pair, _user) = state
        .sessions
        .login(&request.email, &request.password, user_agent)
        .await?;

    Ok(session_response(
        pair,
        state.codec.access_ttl(),
        state.codec.refresh_ttl(),
    ))
}

// =============================================================================
// Registration
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
}

/// A user as returned by the API.
#[derive(Debug, Serialize)]
pub struct UserBody {
    /// User id.
    pub uuid: UserId,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
}

/// POST /api/v1/users/register
///
/// Registers a new user. A taken email is a `409` naming the field.
pub async fn user_registration(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.email.is_empty() || !request.email.contains('@') {
        return Err(ApiError::validation("a valid email is required"));
    }
    if request.password.len() < 8 {
        return Err(ApiError::validation(
            "password must be at least 8 characters",
        ));
    }

    let user = state
        .identity
        .create_user(NewUser {
            email: request.email,
            password_hash: password::hash_password(&request.password)?,
            first_name: request.first_name,
            last_name: request.last_name,
            is_superuser: false,
        })
        .await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(UserBody {
        uuid: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

// =============================================================================
// Refresh Token
// =============================================================================

/// POST /api/v1/users/refresh_token
///
/// Rotates the session pair carried in the cookies. A replayed refresh
/// token fails with `403`; the previous access token is black-listed.
pub async fn refresh_token(
    State(state): State<AppState>,
    cookies: SessionCookies,
) -> ApiResult<impl IntoResponse> {
    let pair = state
        .sessions
        .refresh(&cookies.access_token, &cookies.refresh_token)
        .await?;

    Ok(session_response(
        pair,
        state.codec.access_ttl(),
        state.codec.refresh_ttl(),
    ))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /api/v1/users/logout
///
/// Revokes the current session and clears the cookies. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    cookies: SessionCookies,
) -> ApiResult<impl IntoResponse> {
    state
        .sessions
        .logout(&cookies.access_token, &cookies.refresh_token)
        .await?;

    Ok(clear_session_response())
}

// =============================================================================
// Profile Edit
// =============================================================================

/// Profile edit request body. Unset fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct ChangeUserRequest {
    /// New email.
    pub email: Option<String>,
    /// New password.
    pub password: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
}

/// PUT /api/v1/users/change_user_info
///
/// Edits the authenticated user's own profile.
pub async fn change_user_info(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(request): Json<ChangeUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let password_hash = match request.password.as_deref() {
        Some(password) if password.len() < 8 => {
            return Err(ApiError::validation(
                "password must be at least 8 characters",
            ))
        }
        Some(password) => Some(password::hash_password(password)?),
        None => None,
    };

    let user = state
        .identity
        .update_user(
            ctx.user_id(),
            UserUpdate {
                email: request.email,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
            },
        )
        .await?
        .ok_or_else(|| ApiError::unauthorized("user not found"))?;

    Ok(Json(UserBody {
        uuid: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

// =============================================================================
// Login History
// =============================================================================

/// GET /api/v1/users/login_history
///
/// Returns a page of the authenticated user's login history, newest first.
pub async fn login_history(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    pagination: Pagination,
) -> ApiResult<impl IntoResponse> {
    let events = state
        .identity
        .login_history(ctx.user_id(), pagination.limit(), pagination.offset())
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    Ok(Json(events))
}

// =============================================================================
// Permission Check
// =============================================================================

/// Permission check request body.
#[derive(Debug, Deserialize)]
pub struct CheckPermissionRequest {
    /// The permission name to test.
    pub name: String,
}

/// POST /api/v1/users/check_permission
///
/// Returns whether the caller's current role grants the named permission.
pub async fn check_permission(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Json(request): Json<CheckPermissionRequest>,
) -> ApiResult<impl IntoResponse> {
    let allowed = state
        .guard
        .check_permission(&ctx.claims, &request.name)
        .await?;

    Ok(Json(allowed))
}

// =============================================================================
// Helpers
// =============================================================================

/// Generates a random password for federated-login provisioning.
pub(crate) fn generate_random_password() -> String {
    // Two UUIDs' worth of entropy; the user never types this password.
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

// =============================================================================
// Tests
// =============================================================================
