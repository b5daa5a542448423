// ABOUTME: Core types for the Warden OAuth2 scope service
// ABOUTME: Foundation crate with error handling and shared data models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Warden Core
//!
//! Foundation crate providing the types shared by every layer of the Warden
//! service. It changes infrequently, which keeps incremental builds of the main
//! crate fast.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode`, `AppResult` and RFC 6749 error bodies
//! - **models**: clients, tokens, users and the scope catalogue

/// Unified error handling system with standard error codes
pub mod errors;

/// Core data models (Client, Token, `OAuthUser`, `ScopeCatalogue`)
pub mod models;
