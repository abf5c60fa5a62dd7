// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OAuth provider gateway for federated login.
//!
//! The provider is an external collaborator reached over HTTP: build an
//! authorize redirect, exchange the confirmation code for provider tokens,
//! fetch the user profile. The Yandex gateway is the shipped realization.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

// =============================================================================
// Provider Data
// =============================================================================

/// Tokens returned by the provider's code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// Provider access token.
    pub access_token: String,
    /// Provider refresh token, if granted.
    pub refresh_token: Option<String>,
    /// Provider token lifetime in seconds, if reported.
    pub expires_in: Option<u64>,
}

/// The user profile reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthUserInfo {
    /// Provider-scoped stable user identifier.
    pub external_id: String,
    /// The user's email at the provider.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
}

// =============================================================================
// OAuthProvider Trait
// =============================================================================

/// An OAuth identity provider used for federated login.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Returns the provider name (`yandex`, ...).
    fn name(&self) -> &str;

    /// Builds the URL the client is redirected to for authorization.
    fn authorize_url(&self, state: Option<&str>) -> String;

    /// Exchanges a confirmation code for provider tokens.
    async fn exchange_code(&self, code: &str) -> AuthResult<OAuthTokens>;

    /// Fetches the user profile with a provider access token.
    async fn fetch_user_info(&self, access_token: &str) -> AuthResult<OAuthUserInfo>;
}

// =============================================================================
// Yandex Gateway
// =============================================================================

/// Configuration for the Yandex OAuth gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YandexConfig {
    /// OAuth application id.
    pub client_id: String,
    /// OAuth application secret.
    #[serde(skip_serializing)]
    pub client_secret: String,
    /// Base URL of the authorization server.
    pub oauth_url: String,
    /// Base URL of the profile endpoint.
    pub login_url: String,
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            oauth_url: "https://oauth.yandex.ru/".to_string(),
            login_url: "https://login.yandex.ru/".to_string(),
        }
    }
}

/// Yandex OAuth gateway.
pub struct YandexOAuth {
    config: YandexConfig,
    client: reqwest::Client,
}

impl YandexOAuth {
    /// Creates a gateway from configuration.
    pub fn new(config: YandexConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YandexTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct YandexUserInfo {
    psuid: String,
    default_email: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[async_trait]
impl OAuthProvider for YandexOAuth {
    fn name(&self) -> &str {
        "yandex"
    }

    fn authorize_url(&self, state: Option<&str>) -> String {
        let mut url = format!(
            "{}authorize?response_type=code&client_id={}",
            self.config.oauth_url, self.config.client_id
        );
        if let Some(state) = state {
            url.push_str("&state=");
            url.push_str(state);
        }
        url
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<OAuthTokens> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}token", self.config.oauth_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::unavailable(format!("oauth provider unreachable: {}", e)))?;

        if !response.status().is_success() {
            tracing::debug!(provider = self.name(), status = %response.status(), "code exchange rejected");
            return Err(AuthError::unauthorized("authorization code rejected"));
        }

        let tokens: YandexTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::internal(format!("bad oauth token response: {}", e)))?;

        Ok(OAuthTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
        })
    }

    async fn fetch_user_info(&self, access_token: &str) -> AuthResult<OAuthUserInfo> {
        let response = self
            .client
            .get(format!("{}info", self.config.login_url))
            .query(&[("format", "json")])
            .header("Authorization", format!("OAuth {}", access_token))
            .send()
            .await
            .map_err(|e| AuthError::unavailable(format!("oauth provider unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::unauthorized("provider rejected access token"));
        }

        let info: YandexUserInfo = response
            .json()
            .await
            .map_err(|e| AuthError::internal(format!("bad oauth profile response: {}", e)))?;

        Ok(OAuthUserInfo {
            external_id: info.psuid,
            email: info.default_email,
            first_name: info.first_name,
            last_name: info.last_name,
        })
    }
}

impl std::fmt::Debug for YandexOAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexOAuth")
            .field("client_id", &self.config.client_id)
            .field("oauth_url", &self.config.oauth_url)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_gateway() -> YandexOAuth {
        YandexOAuth::new(YandexConfig {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_authorize_url() {
        let gateway = test_gateway();

        assert_eq!(
            gateway.authorize_url(None),
            "https://oauth.yandex.ru/authorize?response_type=code&client_id=cid"
        );
        assert_eq!(
            gateway.authorize_url(Some("xyz")),
            "https://oauth.yandex.ru/authorize?response_type=code&client_id=cid&state=xyz"
        );
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_string(&YandexConfig {
            client_secret: "hush".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert!(!json.contains("hush"));
    }
}
