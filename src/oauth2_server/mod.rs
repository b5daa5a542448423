// ABOUTME: OAuth 2.0 server side: engine contract, exchanged models and grant handlers
// ABOUTME: The wire protocol itself lives in an external ProtocolEngine implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Protocol engine contract
pub mod engine;
/// Grant handlers
pub mod handlers;
/// Request, grant and token models
pub mod models;

pub use engine::ProtocolEngine;
pub use handlers::{
    AuthorizationCodeHandler, AuthorizationCodeModel, ClientCredentialsHandler,
    ClientCredentialsModel, HandlerBuilder, HandlerCore, Handlers, OAuth2Model, PasswordHandler,
    PasswordModel, ScopeSource,
};
pub use models::{
    AccessTokenGrant, AccessTokenInfo, AuthorizationCodeGrant, AuthorizationCodeRequest,
    AuthorizeRequest, EngineClient, IssuedToken, ResolvedToken, TokenRequest, TokenResponse,
};
