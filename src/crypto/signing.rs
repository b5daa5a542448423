// ABOUTME: Access token signing service backed by HS256 JSON Web Tokens
// ABOUTME: Signs subject, roles, client and scopes; verification never touches storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::models::TokenType;

use crate::errors::{AppError, AppResult};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenPayload {
    /// Subject the token was issued for
    pub subject_id: String,
    /// User ID
    pub user_id: String,
    /// Role names
    #[serde(default)]
    pub roles: Vec<String>,
    /// Identity provider
    #[serde(default)]
    pub provider: String,
    /// Public client ID, or `"NA"`
    #[serde(default)]
    pub client_id: String,
    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Full JWT claim set
#[derive(Debug, Serialize, Deserialize)]
struct SignedClaims {
    #[serde(flatten)]
    payload: AccessTokenPayload,
    typ: TokenType,
    jti: String,
    iat: i64,
    exp: i64,
}

/// Token signing service
pub trait TokenSigner: Send + Sync {
    /// Sign an access token payload
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded
    fn generate(&self, payload: &AccessTokenPayload) -> AppResult<String>;

    /// Verify a signed token of the given kind and return its payload
    ///
    /// # Errors
    ///
    /// Returns an `AuthInvalid` error if the signature, expiry or kind is invalid
    fn verify(&self, kind: TokenType, token: &str) -> AppResult<AccessTokenPayload>;

    /// Lifetime of generated tokens
    fn lifetime(&self) -> Duration;
}

/// HS256 JWT signer
pub struct JwtTokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl JwtTokenSigner {
    /// Create a signer from a shared secret
    #[must_use]
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime,
        }
    }
}

impl TokenSigner for JwtTokenSigner {
    fn generate(&self, payload: &AccessTokenPayload) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AppError::internal("Access token lifetime overflows the clock"))?;
        let claims = SignedClaims {
            payload: payload.clone(),
            typ: TokenType::AccessToken,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))
    }

    fn verify(&self, kind: TokenType, token: &str) -> AppResult<AccessTokenPayload> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<SignedClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Access token verification failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::auth_invalid("Token has expired"),
                _ => AppError::auth_invalid("Token signature is invalid"),
            }
        })?;

        if data.claims.typ != kind {
            return Err(AppError::auth_invalid(format!(
                "Expected a {kind} but received a {}",
                data.claims.typ
            )));
        }

        Ok(data.claims.payload)
    }

    fn lifetime(&self) -> Duration {
        self.lifetime
    }
}
