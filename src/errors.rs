// ABOUTME: Error handling entry point for the Warden service crate
// ABOUTME: Re-exports the unified AppError system from warden-core
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! The error types live in `warden-core` so repository and engine implementations
//! outside this crate can produce them without depending on the service itself.

pub use warden_core::errors::{AppError, AppResult, ErrorCode, OAuth2Error};
