// ABOUTME: Contract of the external OAuth2 protocol engine driving the handshakes
// ABOUTME: The engine calls back into the grant handlers; this crate only consumes it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;

use super::models::{AuthorizationCodeGrant, AuthorizeRequest, TokenRequest, TokenResponse};
use crate::errors::AppResult;

/// Wire-level OAuth2 state machine
#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    /// Issue an authorization code for an authenticated user
    ///
    /// # Errors
    ///
    /// Returns an error if the client, redirect URI or scopes are rejected
    async fn authorize(&self, request: AuthorizeRequest) -> AppResult<AuthorizationCodeGrant>;

    /// Exchange a grant for an access token
    ///
    /// # Errors
    ///
    /// Returns an error if the grant or client credentials are rejected
    async fn token(&self, request: TokenRequest) -> AppResult<TokenResponse>;
}
