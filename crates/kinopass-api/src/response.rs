// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types and session cookie handling.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use kinopass_core::TokenPair;

// =============================================================================
// Token Pair Body
// =============================================================================

/// JSON body returned by login, refresh, and the OAuth webhook.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairBody {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Token scheme.
    pub token_type: String,
    /// Access-token lifetime in seconds.
    pub expires_in: u64,
}

// =============================================================================
// Session Cookies
// =============================================================================

/// Builds the response that establishes a session: both tokens as HttpOnly
/// cookies plus the pair in the body for non-browser clients.
pub fn session_response(
    pair: TokenPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
) -> Response {
    let access_cookie = session_cookie("access_token", &pair.access_token, access_ttl);
    let refresh_cookie = session_cookie("refresh_token", &pair.refresh_token, refresh_ttl);

    let body = TokenPairBody {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: pair.token_type,
        expires_in: access_ttl.as_secs(),
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    append_cookie(&mut response, access_cookie);
    append_cookie(&mut response, refresh_cookie);
    response
}

/// Builds the response that tears a session down: both cookies cleared.
pub fn clear_session_response() -> Response {
    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true })),
    )
        .into_response();

    append_cookie(&mut response, expired_cookie("access_token"));
    append_cookie(&mut response, expired_cookie("refresh_token"));
    response
}

fn session_cookie(name: &str, value: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        value,
        ttl.as_secs()
    )
}

fn expired_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}

fn append_cookie(response: &mut Response, cookie: String) {
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_response_sets_both_cookies() {
        let pair = TokenPair::bearer("acc".to_string(), "ref".to_string());
        let response = session_response(
            pair,
            Duration::from_secs(1200),
            Duration::from_secs(3600),
        );

        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();

        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("access_token=acc;"));
        assert!(cookies[0].contains("Max-Age=1200"));
        assert!(cookies[0].contains("HttpOnly"));
        assert!(cookies[1].starts_with("refresh_token=ref;"));
        assert!(cookies[1].contains("Max-Age=3600"));
    }

    #[test]
    fn test_clear_session_response() {
        let response = clear_session_response();

        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();

        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }
}
