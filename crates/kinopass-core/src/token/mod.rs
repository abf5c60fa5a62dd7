// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed session tokens.
//!
//! This module provides:
//! - The claim set carried by access and refresh tokens
//! - The codec that signs and verifies them

mod claims;
mod codec;

pub use claims::{Claims, TokenKind};
pub use codec::{TokenCodec, TokenConfig};
