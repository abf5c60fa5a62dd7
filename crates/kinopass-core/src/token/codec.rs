// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token codec.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::Claims;
use crate::error::{AuthError, AuthResult, TokenError};

// =============================================================================
// TokenConfig
// =============================================================================

/// Token signing configuration.
///
/// One symmetric algorithm at a time; the secret and algorithm are
/// deployment configuration, not part of the behavioral contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Secret key for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Signing algorithm.
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// Access-token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_ttl: Duration,
    /// Refresh-token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_ttl: Duration,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by deployment
            algorithm: Algorithm::HS256,
            access_ttl: Duration::from_secs(20 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            leeway_secs: 30,
        }
    }
}

impl TokenConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the access-token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Sets the refresh-token lifetime.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AuthResult<()> {
        if self.secret.is_empty() {
            return Err(AuthError::internal("token secret is not configured"));
        }
        if self.secret.len() < 32 {
            tracing::warn!("token secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Encodes and decodes signed session tokens.
///
/// Pure and stateless: encoding always succeeds for valid claims, decoding
/// fails with one of four distinguishable [`TokenError`]s. No network or
/// storage side effects.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<TokenConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    validation_no_exp: Arc<Validation>,
}

impl TokenCodec {
    /// Creates a new codec from the given configuration.
    pub fn new(config: TokenConfig) -> AuthResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        // Signature still verified; only the expiry check is lifted. Used
        // to black-list tokens that have already run out.
        let mut validation_no_exp = validation.clone();
        validation_no_exp.validate_exp = false;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
            validation_no_exp: Arc::new(validation_no_exp),
        })
    }

    /// Encodes claims into a signed token.
    pub fn encode(&self, claims: &Claims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("failed to encode token: {}", e)))
    }

    /// Decodes and verifies a token.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Decodes a token, accepting one that is past its expiry.
    ///
    /// The signature is still verified. Used on cleanup paths where an
    /// already-expired token must still be identified by its `jti`.
    pub fn decode_allow_expired(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation_no_exp)
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }

    /// Returns the configured access-token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.config.access_ttl
    }

    /// Returns the configured refresh-token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.config.refresh_ttl
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.config.algorithm)
            .field("access_ttl", &self.config.access_ttl)
            .field("refresh_ttl", &self.config.refresh_ttl)
            .finish()
    }
}

/// Maps jsonwebtoken failures onto the stable token-error taxonomy.
fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::InvalidAlgorithm
        }
        _ => TokenError::Malformed,
    }
}

// =============================================================================
// Algorithm Serialization
// =============================================================================

mod algorithm_serde {
    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match algorithm {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            _ => return Err(serde::ser::Error::custom("unsupported token algorithm")),
        };
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(serde::de::Error::custom(format!(
                "unsupported token algorithm: {}",
                s
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
            active: true,
            is_superuser: false,
            role_id: None,
        }
    }

    fn test_codec() -> TokenCodec {
        TokenCodec::new(TokenConfig::new(
            "test-secret-key-that-is-long-enough-for-testing",
        ))
        .unwrap()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = test_codec();
        let user = test_user();
        let claims = Claims::access(&user, None, Duration::from_secs(1200));

        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_expired() {
        let codec = TokenCodec::new(
            TokenConfig {
                leeway_secs: 0,
                ..TokenConfig::new("test-secret-key-that-is-long-enough-for-testing")
            },
        )
        .unwrap();
        let user = test_user();

        let mut claims = Claims::access(&user, None, Duration::from_secs(0));
        claims.iat -= 3600;
        claims.exp -= 3600;

        let token = codec.encode(&claims).unwrap();
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));

        // Cleanup paths still recover the jti from an expired token.
        let recovered = codec.decode_allow_expired(&token).unwrap();
        assert_eq!(recovered.jti, claims.jti);
    }

    #[test]
    fn test_decode_foreign_key() {
        let codec_a = test_codec();
        let codec_b =
            TokenCodec::new(TokenConfig::new("another-secret-key-also-long-enough-x")).unwrap();
        let user = test_user();

        let token = codec_a
            .encode(&Claims::refresh(&user, Duration::from_secs(60)))
            .unwrap();

        assert_eq!(codec_b.decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_decode_algorithm_mismatch() {
        let secret = "test-secret-key-that-is-long-enough-for-testing";
        let hs512 = TokenCodec::new(TokenConfig {
            algorithm: Algorithm::HS512,
            ..TokenConfig::new(secret)
        })
        .unwrap();
        let hs256 = TokenCodec::new(TokenConfig::new(secret)).unwrap();
        let user = test_user();

        let token = hs512
            .encode(&Claims::access(&user, None, Duration::from_secs(60)))
            .unwrap();

        assert_eq!(hs256.decode(&token), Err(TokenError::InvalidAlgorithm));
    }

    #[test]
    fn test_decode_garbage() {
        let codec = test_codec();

        assert_eq!(codec.decode("not.a.token"), Err(TokenError::Malformed));
        assert_eq!(codec.decode(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenCodec::new(TokenConfig::default()).is_err());
    }
}
