// ABOUTME: OAuth 2.0 request, grant and token shapes exchanged with the protocol engine
// ABOUTME: Engine-facing client view plus persisted-token rehydration results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::models::{Client, OAuthUser, Token};

use crate::errors::{AppError, AppResult};
use crate::user_data::UserPayload;

/// Client as the protocol engine sees it; the row ID travels as a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineClient {
    /// Stringified row ID
    pub id: String,
    /// Public client ID
    pub client_id: String,
    /// Allowed grant types
    pub grants: Vec<String>,
    /// Registered redirect URIs
    pub redirect_uris: Vec<String>,
}

impl EngineClient {
    /// Row ID of the underlying client
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if the ID is not numeric
    pub fn row_id(&self) -> AppResult<i64> {
        self.id
            .parse()
            .map_err(|_| AppError::invalid_input(format!("Invalid client row ID '{}'", self.id)))
    }
}

impl From<&Client> for EngineClient {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.to_string(),
            client_id: client.client_id.clone(),
            grants: client.grants.clone(),
            redirect_uris: client.redirect_uris.clone(),
        }
    }
}

/// OAuth 2.0 Authorization Request for an already authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    /// Response type (`code`)
    pub response_type: String,
    /// Client identifier
    pub client_id: String,
    /// Redirect URI for response
    pub redirect_uri: String,
    /// Requested scopes, space-delimited
    pub scope: Option<String>,
    /// State parameter for CSRF protection
    pub state: Option<String>,
    /// Authenticated resource owner
    pub user: OAuthUser,
}

/// Authorization code about to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCodeRequest {
    /// Code value
    pub authorization_code: String,
    /// Expiry
    pub expires_at: DateTime<Utc>,
    /// Redirect URI the code is bound to
    pub redirect_uri: String,
    /// Requested scopes, space-delimited
    pub scope: Option<String>,
}

/// Persisted authorization code in the engine's shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationCodeGrant {
    /// Code value
    pub authorization_code: String,
    /// Expiry
    pub expires_at: DateTime<Utc>,
    /// Redirect URI the code is bound to
    pub redirect_uri: String,
    /// Granted scopes
    pub scope: Vec<String>,
    /// Owning client
    pub client: EngineClient,
    /// Resource owner
    pub user: OAuthUser,
}

/// Access token about to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenGrant {
    /// Signed access token
    pub access_token: String,
    /// Expiry
    pub access_token_expires_at: DateTime<Utc>,
    /// Scopes, space-delimited
    pub scope: Option<String>,
}

/// Access token as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Signed access token
    pub access_token: String,
    /// Expiry
    pub access_token_expires_at: DateTime<Utc>,
    /// Normalized scopes
    pub scope: Vec<String>,
    /// Owning client
    pub client: EngineClient,
    /// Resource owner
    pub user: OAuthUser,
}

/// Verified bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenInfo {
    /// Signed access token
    pub access_token: String,
    /// Scopes carried by the signature
    pub scope: Vec<String>,
    /// Re-resolved client
    pub client: EngineClient,
    /// Identity carried by the signature
    pub user: OAuthUser,
}

/// Persisted token with its client and scope-gated user data
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    /// Stored row
    pub token: Token,
    /// Owning client
    pub client: Client,
    /// Flattened user data; `None` for client-only tokens
    pub user: Option<UserPayload>,
}

/// OAuth 2.0 Token Request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Grant type (`authorization_code`, `password`, `client_credentials`)
    pub grant_type: String,
    /// Authorization code (for `authorization_code` grant)
    pub code: Option<String>,
    /// Redirect URI (must match the code)
    pub redirect_uri: Option<String>,
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: Option<String>,
    /// Resource owner username (for `password` grant)
    pub username: Option<String>,
    /// Resource owner password (for `password` grant)
    pub password: Option<String>,
    /// Requested scopes, space-delimited
    pub scope: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenResponse {
    /// Access token (JWT)
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Expires in seconds
    pub expires_in: i64,
    /// Scopes granted, space-delimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Scope-gated user data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserPayload>,
}
