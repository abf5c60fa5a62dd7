// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Federated login handlers.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use kinopass_core::password;
use kinopass_core::types::NewUser;

use crate::error::{ApiError, ApiResult};
use crate::handlers::auth::generate_random_password;
use crate::response::session_response;
use crate::state::AppState;

/// Query parameters for the authorize-url endpoint.
#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    /// Opaque state passed through to the provider.
    pub state: Option<String>,
}

/// GET /api/v1/oauth/{provider}/authorize_url
///
/// Returns the provider URL the client should be redirected to.
pub async fn oauth_authorize_url(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<AuthorizeParams>,
) -> ApiResult<impl IntoResponse> {
    let gateway = state
        .oauth
        .get(&provider)
        .ok_or_else(|| ApiError::bad_request("unknown provider"))?;

    Ok(Json(serde_json::json!({
        "authorize_url": gateway.authorize_url(params.state.as_deref()),
    })))
}

/// Query parameters delivered by the provider redirect.
#[derive(Debug, Deserialize)]
pub struct WebhookParams {
    /// Confirmation code.
    pub code: Option<String>,
    /// Opaque state echoed back by the provider.
    pub state: Option<String>,
}

/// GET /api/v1/oauth/{provider}/webhook
///
/// Redirect target after provider authorization. Exchanges the code,
/// provisions a local user on first login (random password, never typed),
/// and establishes an ordinary session pair.
pub async fn oauth_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<WebhookParams>,
) -> ApiResult<impl IntoResponse> {
    let gateway = state
        .oauth
        .get(&provider)
        .ok_or_else(|| ApiError::bad_request("unknown provider"))?;

    tracing::debug!(provider = %provider, state = ?params.state, "oauth webhook received");

    let code = params
        .code
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("code not found in params"))?;

    let tokens = gateway.exchange_code(code).await?;
    let info = gateway.fetch_user_info(&tokens.access_token).await?;

    let user = match state.identity.find_by_email(&info.email).await? {
        Some(user) => user,
        None => {
            let user = state
                .identity
                .create_user(NewUser {
                    email: info.email.clone(),
                    password_hash: password::hash_password(&generate_random_password())?,
                    first_name: info.first_name.clone(),
                    last_name: info.last_name.clone(),
                    is_superuser: false,
                })
                .await?;

            tracing::info!(
                user_id = %user.id,
                provider = %provider,
                external_id = %info.external_id,
                "provisioned user from federated login"
            );
            user
        }
    };

    if !user.active {
        return Err(ApiError::forbidden("user is deactivated"));
    }

    let pair = state.sessions.issue_pair(&user).await?;

    if let Err(e) = state
        .identity
        .record_login(user.id, &format!("oauth:{}", provider))
        .await
    {
        tracing::warn!(user_id = %user.id, error = %e, "failed to record federated login");
    }

    Ok(session_response(
        pair,
        state.codec.access_ttl(),
        state.codec.refresh_ttl(),
    ))
}
