// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # kinopass-bin
//!
//! Binary crate for the Kinopass auth service: CLI parsing, logging
//! initialization, command dispatch, and graceful shutdown.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod shutdown;
