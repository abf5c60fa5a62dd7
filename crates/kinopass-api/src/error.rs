// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! Maps the core error taxonomy onto HTTP status codes and JSON error
//! responses. Every outcome keeps a distinct error code: clients rely on
//! `TOKEN_EXPIRED` vs `UNAUTHORIZED` vs `FORBIDDEN` to decide between the
//! refresh flow, re-authentication, and giving up.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kinopass_core::{AuthError, StoreError};

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// HTTP-facing error for every handler outcome.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown resource reference (404).
    #[error("Resource not found: {resource}")]
    NotFound {
        /// What the caller asked for.
        resource: String,
    },

    /// Unparseable request (400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// What failed to parse.
        message: String,
    },

    /// Missing, invalid, or revoked credentials (401).
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Why the credentials were rejected.
        message: String,
    },

    /// Valid credentials past their natural expiry (401, distinct code so
    /// clients run the refresh flow).
    #[error("Token has expired")]
    TokenExpired,

    /// Valid identity, insufficient privilege (403).
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Which rule blocked the operation.
        message: String,
    },

    /// Uniqueness violation (409).
    #[error("Conflict: {message}")]
    Conflict {
        /// Names the conflicting field.
        message: String,
    },

    /// Input rejected by a validation rule (422).
    #[error("Validation error: {message}")]
    Validation {
        /// The rule that failed.
        message: String,
    },

    /// Backend unreachable after bounded retries (503).
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Which dependency stayed down.
        message: String,
    },

    /// Unexpected failure (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Detail for the log, not for the client.
        message: String,
    },
}

impl ApiError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// A 404 naming the missing resource.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// A 400 for an unparseable request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// A 401 for rejected credentials.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// A 403 for insufficient privilege.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// A 409 for a uniqueness violation.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// A 422 for a failed validation rule.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// A 503 for an unreachable dependency.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// A 500 for an unexpected failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// The HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The stable machine-readable code in the response body.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether this outcome is the server's fault and logs at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ApiError::Internal { .. } | ApiError::ServiceUnavailable { .. }
        )
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = error_code, status = %status, "request failed");
        } else {
            tracing::debug!(error = %self, code = error_code, status = %status, "request rejected");
        }

        let body = ErrorResponseBody {
            error: ErrorDetails {
                code: error_code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Error Response Body
// =============================================================================

/// JSON envelope every error response carries.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseBody {
    /// The error payload.
    pub error: ErrorDetails,
}

/// The payload inside [`ErrorResponseBody`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Stable code clients branch on.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

// =============================================================================
// From Implementations
// =============================================================================

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Malformed { message } => ApiError::bad_request(message),
            AuthError::Expired => ApiError::TokenExpired,
            AuthError::Unauthorized { message } => ApiError::unauthorized(message),
            AuthError::Forbidden { message } => ApiError::forbidden(message),
            AuthError::NotFound { resource } => ApiError::not_found(resource),
            AuthError::Conflict { field } => {
                ApiError::conflict(format!("{} already exists", field))
            }
            AuthError::Unavailable { message } => ApiError::service_unavailable(message),
            AuthError::Internal { message } => ApiError::internal(message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::from(AuthError::from(err))
    }
}

// =============================================================================
// Tests
// =============================================================================
