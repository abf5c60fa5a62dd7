// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Binary-level errors.

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The API layer failed.
    #[error(transparent)]
    Api(#[from] kinopass_api::ApiError),

    /// The revocation cache could not be reached at startup.
    #[error("cache error: {0}")]
    Cache(#[from] kinopass_core::CacheError),

    /// The identity store failed during bootstrap.
    #[error("store error: {0}")]
    Store(#[from] kinopass_core::StoreError),
}
