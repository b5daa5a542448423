// ABOUTME: Grant handlers the protocol engine calls into
// ABOUTME: Shared core plus authorization code, password and client credentials handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Per grant, a token moves through `requested -> validated -> issued`, and an
//! authorization code may additionally be revoked after exchange.

/// Authorization code grant
pub mod authorization_code;
/// Async handler assembly
pub mod builder;
/// Client credentials grant
pub mod client_credentials;
/// Shared state and the `OAuth2Model` contract
pub mod core;
/// Password grant
pub mod password;

pub use authorization_code::{AuthorizationCodeHandler, AuthorizationCodeModel};
pub use builder::{HandlerBuilder, Handlers, ScopeSource};
pub use client_credentials::{ClientCredentialsHandler, ClientCredentialsModel};
pub use self::core::{HandlerCore, OAuth2Model};
pub use password::{PasswordHandler, PasswordModel};
