// ABOUTME: Persisted token rows for authorization codes and access tokens
// ABOUTME: Tokens are created once per grant and only their status may change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of value a token row stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived code exchanged at the token endpoint
    AuthorizationCode,
    /// Bearer access token
    AccessToken,
}

impl TokenType {
    /// Wire representation used in repository filters
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::AccessToken => "access_token",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a token row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Usable
    Activated,
    /// Explicitly revoked
    Revoked,
}

/// Stored token row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token value (authorization code or access token)
    pub token: String,
    /// Token kind
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Lifecycle status
    pub status: TokenStatus,
    /// Row ID of the owning client
    pub client_id: i64,
    /// Owning user, absent for client-only grants
    #[serde(default)]
    pub user_id: Option<String>,
    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Grant-specific details (expiry, redirect URI, ...)
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Token {
    /// Whether the token may still be used
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.status == TokenStatus::Activated
    }
}
