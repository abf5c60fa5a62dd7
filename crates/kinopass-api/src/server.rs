// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::future::Future;

use axum::{
    http::{HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::{ApiConfig, CorsConfig};
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::AuthLayer;
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let config = self.state.config.clone();
        let base = config.base_path.trim_end_matches('/').to_string();

        let auth = AuthLayer::new(self.state.guard.clone()).with_public_paths(vec![
            "/health".to_string(),
            "/ready".to_string(),
            format!("{}/users/login", base),
            format!("{}/users/register", base),
            format!("{}/users/refresh_token", base),
            format!("{}/oauth/*", base),
        ]);

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.request_timeout))
            .layer(create_cors_layer(&config.cors))
            .layer(auth);

        let api = Router::new()
            // Session endpoints
            .route("/users/login", post(handlers::login))
            .route("/users/register", post(handlers::user_registration))
            .route("/users/refresh_token", post(handlers::refresh_token))
            .route("/users/logout", post(handlers::logout))
            .route("/users/change_user_info", put(handlers::change_user_info))
            .route("/users/login_history", get(handlers::login_history))
            .route("/users/check_permission", post(handlers::check_permission))
            // Role catalog and assignment
            .route("/roles", post(handlers::create_role).get(handlers::list_roles))
            .route(
                "/roles/{role_id}",
                put(handlers::update_role).delete(handlers::delete_role),
            )
            .route("/roles/set/{user_id}/{role_id}", post(handlers::assign_role))
            .route("/roles/unset/{user_id}", post(handlers::unassign_role))
            // Permission catalog
            .route("/permissions", post(handlers::create_permission))
            .route(
                "/permissions/{permission_id}",
                axum::routing::delete(handlers::delete_permission),
            )
            .route(
                "/permissions/attach/{permission_id}/{role_id}",
                post(handlers::attach_permission),
            )
            .route(
                "/permissions/detach/{permission_id}/{role_id}",
                post(handlers::detach_permission),
            )
            // Federated login
            .route(
                "/oauth/{provider}/authorize_url",
                get(handlers::oauth_authorize_url),
            )
            .route("/oauth/{provider}/webhook", get(handlers::oauth_webhook));

        Router::new()
            // Health endpoints (public)
            .route("/health", get(handlers::health))
            .route("/ready", get(handlers::ready))
            .nest(&base, api)
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server until the shutdown future resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> ApiResult<()> {
        let addr = self.state.config.socket_addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("failed to bind {}: {}", addr, e)))?;

        info!(%addr, "API server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::internal(format!("server error: {}", e)))?;

        info!("API server stopped");
        Ok(())
    }
}

// =============================================================================
// CORS
// =============================================================================

/// Creates the CORS layer from configuration.
fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    if config.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();
    layer.allow_headers(headers)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kinopass_core::TokenConfig;

    #[test]
    fn test_router_builds() {
        let state = AppState::builder()
            .config(
                ApiConfig::default()
                    .with_token(TokenConfig::new("test-secret-key-that-is-long-enough-xx")),
            )
            .build()
            .unwrap();

        // Route table and middleware stack assemble without panicking.
        let _router = ApiServer::new(state).router();
    }
}
