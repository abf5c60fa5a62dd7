// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # kinopass-core
//!
//! Core session and authorization logic for the Kinopass auth service of the
//! movie-catalog platform.
//!
//! This crate provides the building blocks shared by the HTTP surface and the
//! binary:
//!
//! - **Token**: signed session token codec and claims (`access` / `refresh`)
//! - **Revocation**: cache-backed white-list (valid refresh tokens) and
//!   black-list (invalidated access tokens)
//! - **Session**: pair issuance, refresh rotation, and logout
//! - **Guard**: access-token authentication and privilege checks
//! - **Identity**: trait over the external users/roles/permissions store
//! - **OAuth**: federated-login provider gateway
//! - **Retry**: bounded exponential backoff for transient I/O failures
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kinopass_core::{
//!     cache::MemoryTokenCache, identity::MemoryIdentityStore,
//!     RevocationStore, SessionManager, TokenCodec, TokenConfig,
//! };
//!
//! let codec = Arc::new(TokenCodec::new(TokenConfig::new("a-very-long-secret"))?);
//! let revocation = Arc::new(RevocationStore::new(Arc::new(MemoryTokenCache::new())));
//! let identity = Arc::new(MemoryIdentityStore::new());
//!
//! let sessions = SessionManager::new(codec, revocation, identity);
//! let (pair, _user) = sessions.login("a@x.com", "p1", None).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod types;

// =============================================================================
// Token & Revocation Modules
// =============================================================================

pub mod cache;
pub mod retry;
pub mod revocation;
pub mod token;

// =============================================================================
// Identity & Session Modules
// =============================================================================

pub mod guard;
pub mod identity;
pub mod oauth;
pub mod password;
pub mod session;

pub use error::{AuthError, AuthResult, CacheError, StoreError, TokenError};
pub use guard::AccessGuard;
pub use revocation::{RevocationList, RevocationStore};
pub use session::{SessionManager, TokenPair};
pub use token::{Claims, TokenCodec, TokenConfig, TokenKind};
