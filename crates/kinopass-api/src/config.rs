// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use kinopass_core::oauth::YandexConfig;
use kinopass_core::retry::RetryConfig;
use kinopass_core::TokenConfig;

use crate::error::{ApiError, ApiResult};

// =============================================================================
// ApiConfig
// =============================================================================

/// Top-level configuration of the auth service, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// Port to bind.
    pub port: u16,
    /// Prefix every API route is nested under.
    pub base_path: String,
    /// Per-request deadline.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Cross-origin policy.
    pub cors: CorsConfig,
    /// Token signing configuration.
    pub token: TokenConfig,
    /// Revocation cache configuration.
    pub cache: CacheConfig,
    /// OAuth provider configuration.
    pub oauth: OAuthSettings,
    /// Bootstrap configuration for development deployments.
    pub bootstrap: BootstrapConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8081,
            base_path: "/api/v1".to_string(),
            request_timeout: Duration::from_secs(30),
            cors: CorsConfig::default(),
            token: TokenConfig::default(),
            cache: CacheConfig::default(),
            oauth: OAuthSettings::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApiError::validation(format!("cannot read config {}: {}", path.display(), e))
        })?;

        toml::from_str(&raw).map_err(|e| {
            ApiError::validation(format!("cannot parse config {}: {}", path.display(), e))
        })
    }

    /// The address the listener binds.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Overrides the bind address.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replaces the token signing configuration.
    pub fn with_token(mut self, token: TokenConfig) -> Self {
        self.token = token;
        self
    }
}

// =============================================================================
// CacheConfig
// =============================================================================

/// Revocation cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis URL (`redis://host:port`). When unset, the server falls back
    /// to the in-memory cache - single-process deployments only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Retry policy for cache operations.
    pub retry: RetryConfig,
}

// =============================================================================
// OAuthSettings
// =============================================================================

/// OAuth provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OAuthSettings {
    /// Yandex provider, enabled when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yandex: Option<YandexConfig>,
}

// =============================================================================
// BootstrapConfig
// =============================================================================

/// Development bootstrap: seeds the identity store with one superuser so a
/// fresh deployment has a way in.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Email of the bootstrap superuser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superuser_email: Option<String>,
    /// Password of the bootstrap superuser.
    #[serde(skip_serializing)]
    pub superuser_password: Option<String>,
}

// =============================================================================
// CorsConfig
// =============================================================================

/// Cross-origin policy for browser clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API; `*` opens it to any.
    pub allowed_origins: Vec<String>,
    /// Methods exposed cross-origin.
    pub allowed_methods: Vec<String>,
    /// Headers accepted cross-origin.
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
            ],
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();

        assert_eq!(config.port, 8081);
        assert_eq!(config.base_path, "/api/v1");
        assert!(config.cache.url.is_none());
        assert!(config.oauth.yandex.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig::default().with_port(9000);
        assert_eq!(config.socket_addr().port(), 9000);
    }

    #[test]
    fn test_parse_toml() {
        let raw = r#"
            port = 9090

            [token]
            secret = "config-secret-key-that-is-long-enough"
            access_ttl = "20m"
            refresh_ttl = "30d"

            [cache]
            url = "redis://localhost:6379"

            [cache.retry]
            max_attempts = 5
        "#;

        let config: ApiConfig = toml::from_str(raw).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.token.access_ttl, Duration::from_secs(20 * 60));
        assert_eq!(
            config.token.refresh_ttl,
            Duration::from_secs(30 * 24 * 60 * 60)
        );
        assert_eq!(config.cache.url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.cache.retry.max_attempts, 5);
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut config = ApiConfig::default();
        config.token.secret = "hush-hush-token-secret".to_string();
        config.bootstrap.superuser_password = Some("hush-password".to_string());

        let out = toml::to_string(&config).unwrap();
        assert!(!out.contains("hush-hush-token-secret"));
        assert!(!out.contains("hush-password"));
    }
}
