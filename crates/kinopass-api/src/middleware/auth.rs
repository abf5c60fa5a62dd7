// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access-token authentication middleware.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use kinopass_core::AccessGuard;

use crate::context::AuthContext;
use crate::error::ApiError;
use crate::extractors::{bearer_token, cookie_value};

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer that authenticates every non-public request.
///
/// The access token is taken from the `Authorization: Bearer` header or the
/// `access_token` cookie, validated by the [`AccessGuard`] (signature, kind,
/// expiry, black-list), and the resulting context is attached to the
/// request.
#[derive(Clone)]
pub struct AuthLayer {
    guard: Arc<AccessGuard>,
    public_paths: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// Creates a layer over the given guard with no public paths.
    pub fn new(guard: Arc<AccessGuard>) -> Self {
        Self {
            guard,
            public_paths: Arc::new(HashSet::new()),
        }
    }

    /// Declares the paths that skip authentication entirely.
    ///
    /// A trailing `*` matches any path with that prefix.
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = Arc::new(paths.into_iter().collect());
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            guard: self.guard.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// The per-request service produced by [`AuthLayer`].
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    guard: Arc<AccessGuard>,
    public_paths: Arc<HashSet<String>>,
}

impl<S> AuthMiddleware<S> {
    fn is_public_path(&self, path: &str) -> bool {
        if self.public_paths.contains(path) {
            return true;
        }

        for public_path in self.public_paths.iter() {
            if let Some(prefix) = public_path.strip_suffix('*') {
                if path.starts_with(prefix) {
                    return true;
                }
            }
        }

        false
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let guard = self.guard.clone();
        let is_public = self.is_public_path(req.uri().path());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_public {
                return inner.call(req).await;
            }

            let token = bearer_token(req.headers())
                .or_else(|| cookie_value(req.headers(), "access_token"));

            let Some(token) = token else {
                tracing::debug!(path = %req.uri().path(), "no access token provided");
                return Ok(
                    ApiError::unauthorized("no access token provided").into_response()
                );
            };

            match guard.authenticate(&token).await {
                Ok(claims) => {
                    let ctx = AuthContext::from_claims(claims);
                    req.extensions_mut().insert(ctx);
                    inner.call(req).await
                }
                Err(e) => {
                    tracing::debug!(error = %e, "access token rejected");
                    Ok(ApiError::from(e).into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
