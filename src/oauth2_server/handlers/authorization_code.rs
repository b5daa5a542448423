// ABOUTME: Authorization code grant handler: code persistence, rehydration and revocation
// ABOUTME: Only scopes that resolve against the catalogue are stored with a code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use warden_core::models::{OAuthUser, Token, TokenStatus, TokenType};

use super::core::{HandlerCore, OAuth2Model};
use crate::errors::{AppError, AppResult};
use crate::oauth2_server::models::{AuthorizationCodeGrant, AuthorizationCodeRequest, EngineClient};

/// Authorization code operations the protocol engine needs
#[async_trait]
pub trait AuthorizationCodeModel: OAuth2Model {
    /// Persist a code with the validated subset of its scopes
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails
    async fn save_authorization_code(
        &self,
        code: AuthorizationCodeRequest,
        client: &EngineClient,
        user: &OAuthUser,
    ) -> AppResult<AuthorizationCodeGrant>;

    /// Rehydrate a stored code
    ///
    /// # Errors
    ///
    /// Returns an error if the code is missing, not activated or expired
    async fn get_authorization_code(&self, code: &str) -> AppResult<AuthorizationCodeGrant>;

    /// Revoke a code after exchange
    ///
    /// # Errors
    ///
    /// Never fails for the built-in handler
    async fn revoke_authorization_code(&self, code: &AuthorizationCodeGrant) -> AppResult<bool>;
}

/// Handler backing the `authorization_code` grant
pub struct AuthorizationCodeHandler {
    core: Arc<HandlerCore>,
}

impl AuthorizationCodeHandler {
    /// Create a handler over shared state
    #[must_use]
    pub const fn new(core: Arc<HandlerCore>) -> Self {
        Self { core }
    }
}

impl OAuth2Model for AuthorizationCodeHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}

/// Grant-time user attributes kept with the code so rehydration is lossless
fn code_details(code: &AuthorizationCodeRequest, user: &OAuthUser) -> Value {
    json!({
        "redirect_uri": code.redirect_uri,
        "expires_at": code.expires_at,
        "subject_id": user.subject_id,
        "roles": user.roles,
        "provider": user.provider,
    })
}

fn detail_str<'a>(details: &'a Value, key: &str) -> Option<&'a str> {
    details.get(key).and_then(Value::as_str)
}

#[async_trait]
impl AuthorizationCodeModel for AuthorizationCodeHandler {
    async fn save_authorization_code(
        &self,
        code: AuthorizationCodeRequest,
        client: &EngineClient,
        user: &OAuthUser,
    ) -> AppResult<AuthorizationCodeGrant> {
        let validation = self.core.scopes.validate_scopes(code.scope.as_deref());
        if let Some(invalid) = &validation.invalid_scopes {
            warn!(
                client_id = %client.client_id,
                dropped = ?invalid,
                "Dropping scopes the catalogue does not grant"
            );
        }

        self.core
            .tokens
            .create(Token {
                token: code.authorization_code.clone(),
                token_type: TokenType::AuthorizationCode,
                status: TokenStatus::Activated,
                client_id: client.row_id()?,
                user_id: Some(user.id.clone()),
                scopes: validation.granted_scopes.clone(),
                details: code_details(&code, user),
            })
            .await?;

        info!(
            client_id = %client.client_id,
            user_id = %user.id,
            scopes = validation.granted_scopes.len(),
            "Authorization code issued"
        );

        Ok(AuthorizationCodeGrant {
            authorization_code: code.authorization_code,
            expires_at: code.expires_at,
            redirect_uri: code.redirect_uri,
            scope: validation.granted_scopes,
            client: client.clone(),
            user: user.clone(),
        })
    }

    async fn get_authorization_code(&self, code: &str) -> AppResult<AuthorizationCodeGrant> {
        let resolved = self
            .core
            .get_token(TokenType::AuthorizationCode, code)
            .await?;
        let details = &resolved.token.details;

        let expires_at = details
            .get("expires_at")
            .cloned()
            .and_then(|v| serde_json::from_value::<DateTime<Utc>>(v).ok())
            .ok_or_else(|| AppError::invalid_state("Authorization code has no expiry"))?;
        if expires_at <= Utc::now() {
            return Err(AppError::invalid_state("Authorization code has expired"));
        }

        let user_id = resolved
            .token
            .user_id
            .clone()
            .ok_or_else(|| AppError::invalid_state("Authorization code has no user"))?;

        let mut user = OAuthUser::new(
            user_id,
            detail_str(details, "provider").unwrap_or_default(),
        );
        if let Some(subject) = detail_str(details, "subject_id") {
            user = user.with_subject(subject);
        }
        if let Some(roles) = details
            .get("roles")
            .cloned()
            .and_then(|v| serde_json::from_value::<Vec<String>>(v).ok())
        {
            user = user.with_roles(roles);
        }
        if let Some(payload) = resolved.user {
            user = user.with_profile(payload.into_inner());
        }

        Ok(AuthorizationCodeGrant {
            authorization_code: resolved.token.token.clone(),
            expires_at,
            redirect_uri: detail_str(details, "redirect_uri")
                .unwrap_or_default()
                .to_owned(),
            scope: resolved.token.scopes.clone(),
            client: EngineClient::from(&resolved.client),
            user,
        })
    }

    async fn revoke_authorization_code(&self, code: &AuthorizationCodeGrant) -> AppResult<bool> {
        // Codes stay activated; single use is enforced by the engine.
        debug!(client_id = %code.client.client_id, "Authorization code revocation acknowledged");
        Ok(true)
    }
}
