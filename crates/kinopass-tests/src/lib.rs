// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # kinopass-tests
//!
//! Integration tests and shared fixtures for the Kinopass auth service.

pub mod common;
