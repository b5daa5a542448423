// ABOUTME: RFC 6749 error response bodies for the external protocol engine
// ABOUTME: Maps AppError codes onto invalid_client, invalid_grant and friends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use super::{AppError, ErrorCode};

/// OAuth 2.0 Error Response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// URI for error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl OAuth2Error {
    fn with_uri(error: &str, description: &str, uri: &str) -> Self {
        Self {
            error: error.to_owned(),
            error_description: Some(description.to_owned()),
            error_uri: Some(uri.to_owned()),
        }
    }

    /// Create an `invalid_request` error
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self::with_uri(
            "invalid_request",
            description,
            "https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1",
        )
    }

    /// Create an `invalid_client` error
    #[must_use]
    pub fn invalid_client() -> Self {
        Self::with_uri(
            "invalid_client",
            "Client authentication failed",
            "https://datatracker.ietf.org/doc/html/rfc6749#section-5.2",
        )
    }

    /// Create an `invalid_grant` error
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self::with_uri(
            "invalid_grant",
            description,
            "https://datatracker.ietf.org/doc/html/rfc6749#section-5.2",
        )
    }

    /// Create an `invalid_scope` error
    #[must_use]
    pub fn invalid_scope(description: &str) -> Self {
        Self::with_uri(
            "invalid_scope",
            description,
            "https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1",
        )
    }

    /// Create a `server_error` error
    #[must_use]
    pub fn server_error() -> Self {
        Self {
            error: "server_error".to_owned(),
            error_description: Some("The authorization server encountered an error".to_owned()),
            error_uri: None,
        }
    }
}

impl From<&AppError> for OAuth2Error {
    fn from(error: &AppError) -> Self {
        match error.code {
            ErrorCode::AuthInvalid | ErrorCode::DecryptionFailed => Self::invalid_client(),
            ErrorCode::ResourceNotFound | ErrorCode::InvalidState => {
                Self::invalid_grant(&error.message)
            }
            ErrorCode::PermissionDenied => Self::invalid_scope(&error.message),
            ErrorCode::InvalidInput => Self::invalid_request(&error.message),
            _ => Self::server_error(),
        }
    }
}
