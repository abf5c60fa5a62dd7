// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types shared across the auth core.
//!
//! The taxonomy is deliberately flat and stable: callers distinguish
//! `Expired` from `Unauthorized` from `Forbidden` to decide between
//! re-authentication, the refresh flow, and a hard rejection. Errors are
//! never collapsed into a generic failure on the way up.

use thiserror::Error;

/// Result type alias for auth-core operations.
pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// TokenError
// =============================================================================

/// Failures produced when decoding a signed session token.
///
/// Every decode failure is distinguishable so callers can choose between
/// rejecting outright and prompting the refresh flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token is structurally invalid and cannot be parsed.
    #[error("malformed token")]
    Malformed,

    /// The signature does not verify (tampered token or foreign key).
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token was signed with a different algorithm than configured.
    #[error("invalid token algorithm")]
    InvalidAlgorithm,

    /// The current time is past the token's `exp` claim.
    #[error("token has expired")]
    Expired,
}

// =============================================================================
// CacheError
// =============================================================================

/// Errors from the shared revocation cache.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The cache could not be reached. Retryable.
    #[error("cache connection failed: {message}")]
    Connection {
        /// Underlying error description.
        message: String,
    },

    /// The cache rejected the operation. Not retryable.
    #[error("cache operation failed: {message}")]
    Internal {
        /// Underlying error description.
        message: String,
    },
}

impl CacheError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Errors from the external identity store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated on create/update.
    #[error("{field} already exists")]
    Conflict {
        /// The conflicting field (`email`, `role type`, `permission name`).
        field: &'static str,
    },

    /// The store could not be reached. Retryable.
    #[error("store connection failed: {message}")]
    Connection {
        /// Underlying error description.
        message: String,
    },

    /// The store rejected the operation. Not retryable.
    #[error("store operation failed: {message}")]
    Internal {
        /// Underlying error description.
        message: String,
    },
}

impl StoreError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// =============================================================================
// Transient Classification
// =============================================================================

/// Classifies errors that may succeed when the operation is retried.
///
/// Connectivity hiccups to the cache or the identity store are transient;
/// everything else is permanent and must not be retried.
pub trait Transient {
    /// Returns `true` if retrying the failed operation may succeed.
    fn is_transient(&self) -> bool;
}

impl Transient for CacheError {
    fn is_transient(&self) -> bool {
        matches!(self, CacheError::Connection { .. })
    }
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Connection { .. })
    }
}

// =============================================================================
// AuthError
// =============================================================================

/// The unified error taxonomy surfaced to callers of the auth core.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Input that cannot be parsed (credentials, request shape).
    #[error("malformed input: {message}")]
    Malformed {
        /// Error message.
        message: String,
    },

    /// The presented access token is past its natural expiry.
    ///
    /// Surfaced distinctly from `Unauthorized` so clients know to run the
    /// refresh flow instead of re-authenticating.
    #[error("token has expired")]
    Expired,

    /// Missing, invalid, or revoked access token.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Error message.
        message: String,
    },

    /// Valid identity, insufficient privilege, or a replayed/invalidated
    /// refresh token.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Error message.
        message: String,
    },

    /// Unknown identity, role, or permission reference.
    #[error("{resource} not found")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Uniqueness violation on create/update.
    #[error("{field} already exists")]
    Conflict {
        /// The conflicting field.
        field: String,
    },

    /// The cache or store stayed unreachable after bounded retries.
    ///
    /// Authorization-relevant checks treat this as "cannot confirm
    /// revocation state" and reject rather than assume the token is clean.
    #[error("service unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },

    /// Unexpected internal failure.
    #[error("internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl AuthError {
    /// Creates a malformed-input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a conflict error naming the conflicting field.
    pub fn conflict(field: impl Into<String>) -> Self {
        Self::Conflict {
            field: field.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::Expired,
            TokenError::Malformed => AuthError::unauthorized("invalid authentication credentials"),
            TokenError::InvalidSignature => AuthError::unauthorized("invalid token signature"),
            TokenError::InvalidAlgorithm => AuthError::unauthorized("invalid token algorithm"),
        }
    }
}

impl From<CacheError> for AuthError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Connection { message } => AuthError::unavailable(message),
            CacheError::Internal { message } => AuthError::internal(message),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { field } => AuthError::conflict(field),
            StoreError::Connection { message } => AuthError::unavailable(message),
            StoreError::Internal { message } => AuthError::internal(message),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
