// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};
use serde::Deserialize;

use crate::context::AuthContext;
use crate::error::ApiError;

/// Largest page size the history endpoints hand out.
const PAGE_MAX_SIZE: u32 = 100;

// =============================================================================
// Cookie Helpers
// =============================================================================

/// Reads a cookie value from the `Cookie` request header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Reads a bearer token from the `Authorization` request header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer ").map(|s| s.to_string()))
}

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Pulls the [`AuthContext`] the middleware stored in request extensions.
/// Returns 401 if the request did not pass authentication.
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

// =============================================================================
// Session Cookies Extractor
// =============================================================================

/// Extractor for the session cookie pair set at login.
pub struct SessionCookies {
    /// Raw access token.
    pub access_token: String,
    /// Raw refresh token.
    pub refresh_token: String,
}

impl<S> FromRequestParts<S> for SessionCookies
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let access_token = cookie_value(&parts.headers, "access_token");
        let refresh_token = cookie_value(&parts.headers, "refresh_token");

        match (access_token, refresh_token) {
            (Some(access_token), Some(refresh_token)) => Ok(Self {
                access_token,
                refresh_token,
            }),
            _ => Err(ApiError::unauthorized("session tokens not found")),
        }
    }
}

// =============================================================================
// Pagination Extractor
// =============================================================================

#[derive(Debug, Deserialize)]
struct PaginationQuery {
    #[serde(default = "default_page_number")]
    page_number: u32,
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn default_page_number() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

/// Query parameters for paginated endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Page number (1-indexed).
    pub page_number: u32,
    /// Items per page.
    pub page_size: u32,
}

impl Pagination {
    /// Returns the item offset of this page.
    pub fn offset(&self) -> usize {
        (self.page_size as usize) * (self.page_number as usize - 1)
    }

    /// Returns the page size as a limit.
    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PaginationQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(format!("invalid pagination: {}", e)))?;

        if query.page_number == 0 || query.page_size == 0 {
            return Err(ApiError::validation(
                "page_number and page_size must be at least 1",
            ));
        }
        if query.page_size > PAGE_MAX_SIZE {
            return Err(ApiError::validation(format!(
                "page_size must not exceed {}",
                PAGE_MAX_SIZE
            )));
        }

        Ok(Pagination {
            page_number: query.page_number,
            page_size: query.page_size,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token=abc; refresh_token=def"),
        );

        assert_eq!(cookie_value(&headers, "access_token").as_deref(), Some("abc"));
        assert_eq!(
            cookie_value(&headers, "refresh_token").as_deref(),
            Some("def")
        );
        assert_eq!(cookie_value(&headers, "other"), None);
    }

    #[test]
    fn test_cookie_value_ignores_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token="));

        assert_eq!(cookie_value(&headers, "access_token"), None);
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer mytoken123"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("mytoken123"));
    }

    #[test]
    fn test_pagination_offset() {
        let page = Pagination {
            page_number: 3,
            page_size: 10,
        };

        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }
}
