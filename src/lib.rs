// ABOUTME: Main library entry point for the Warden OAuth2 scope service
// ABOUTME: Token issuance and validation with field-level, scope-gated user data access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Warden OAuth2
//!
//! Sits between an external OAuth2 protocol engine and a data store holding
//! users, clients, tokens and scope definitions.
//!
//! ## Architecture
//!
//! - **Scopes**: catalogue validation and `resource:action:path` resolution
//! - **User data**: scopes to a minimal read query, flattened into the token payload
//! - **`OAuth2` server**: grant handlers the protocol engine calls into
//! - **Services**: sign-in redirect, code exchange and client webhooks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use warden_oauth2::errors::AppResult;
//! use warden_oauth2::scopes::ScopeManager;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let manager = ScopeManager::load("scopes.yaml").await?;
//!     let validation = manager.validate_scopes("user:read:basic bogus:scope");
//!     println!("granted: {:?}", validation.granted_scopes);
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────

/// Application authentication seam
pub mod auth;

/// Environment configuration
pub mod config;

/// Domain constants
pub mod constants;

/// Client token cipher and access token signer
pub mod crypto;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Outbound HTTP client
pub mod network;

/// Protocol engine contract, models and grant handlers
pub mod oauth2_server;

/// Persistence abstraction
pub mod repository;

/// Scope catalogue and resolution
pub mod scopes;

/// Orchestration services
pub mod services;

/// Scope-gated user data fetching
pub mod user_data;
