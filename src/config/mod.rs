// ABOUTME: Configuration management module for centralized service settings
// ABOUTME: Environment-only configuration, no configuration files besides the scope catalogue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the Warden service
//!
//! - **Environment**: secrets, lifetimes and webhook limits from environment variables
//!
//! The scope catalogue itself is loaded by [`crate::scopes::ScopeManager`].

/// Environment and service configuration
pub mod environment;

pub use environment::{CallbackConfig, ClientTokenConfig, Environment, ServiceConfig, TokenConfig};
