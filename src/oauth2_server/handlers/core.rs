// ABOUTME: Shared grant handler state and the OAuth2Model contract every grant implements
// ABOUTME: Client lookup, token signing, persistence and scope-gated token rehydration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use warden_core::models::{Client, OAuthUser, Token, TokenStatus, TokenType};

use crate::constants::oauth2::NO_CLIENT;
use crate::crypto::{AccessTokenPayload, TokenSigner};
use crate::errors::{AppError, AppResult};
use crate::oauth2_server::models::{
    AccessTokenGrant, AccessTokenInfo, EngineClient, IssuedToken, ResolvedToken,
};
use crate::repository::{Filter, Repository};
use crate::scopes::{RawScopes, ScopeManager};
use crate::user_data::{DegradedReason, FetchRequest, UserDataFetcher, UserFetch};

/// Collaborators shared by every grant handler
pub struct HandlerCore {
    pub(crate) scopes: Arc<ScopeManager>,
    pub(crate) fetcher: Arc<UserDataFetcher>,
    pub(crate) clients: Arc<dyn Repository<Client>>,
    pub(crate) tokens: Arc<dyn Repository<Token>>,
    pub(crate) signer: Arc<dyn TokenSigner>,
    pub(crate) auth_code_lifetime: Duration,
}

impl HandlerCore {
    /// Scope manager
    #[must_use]
    pub const fn scope_manager(&self) -> &Arc<ScopeManager> {
        &self.scopes
    }

    /// User data fetcher
    #[must_use]
    pub const fn fetcher(&self) -> &Arc<UserDataFetcher> {
        &self.fetcher
    }

    /// Lifetime of signed access tokens
    #[must_use]
    pub fn access_token_lifetime(&self) -> Duration {
        self.signer.lifetime()
    }

    /// Lifetime of authorization codes
    #[must_use]
    pub const fn auth_code_lifetime(&self) -> Duration {
        self.auth_code_lifetime
    }

    /// Client row by public client ID
    ///
    /// # Errors
    ///
    /// Returns a `ResourceNotFound` error if no client has this ID
    pub async fn find_client(&self, client_id: &str) -> AppResult<Client> {
        self.clients
            .find_one(&Filter::new().where_eq("client_id", client_id))
            .await?
            .ok_or_else(|| AppError::not_found("Client"))
    }

    async fn find_client_by_row_id(&self, row_id: i64) -> AppResult<Client> {
        self.clients
            .find_one(&Filter::new().where_eq("id", row_id))
            .await?
            .ok_or_else(|| AppError::not_found("Client"))
    }

    /// Client lookup, optionally authenticated by secret
    ///
    /// # Errors
    ///
    /// Returns a `ResourceNotFound` error if the client is absent or the secret does not match
    pub async fn get_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> AppResult<EngineClient> {
        let client = self.find_client(client_id).await?;

        if let Some(secret) = client_secret {
            let matches = client
                .client_secret
                .as_deref()
                .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(secret.as_bytes())));
            if !matches {
                debug!(client_id, "Client secret mismatch");
                return Err(AppError::not_found("Client"));
            }
        }

        Ok(EngineClient::from(&client))
    }

    /// Sign an access token for a user and client; nothing is persisted
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails
    pub fn generate_access_token(
        &self,
        client: &EngineClient,
        user: &OAuthUser,
        scopes: impl Into<RawScopes>,
    ) -> AppResult<String> {
        let payload = AccessTokenPayload {
            subject_id: user.subject_id.clone(),
            user_id: user.id.clone(),
            roles: user.roles.clone(),
            provider: user.provider.clone(),
            client_id: client.client_id.clone(),
            scopes: self.scopes.normalize_scopes(scopes),
        };
        self.signer.generate(&payload)
    }

    /// Persist an activated access token row
    ///
    /// # Errors
    ///
    /// Returns an error if the client row ID is invalid or persistence fails
    pub async fn save_token(
        &self,
        token: AccessTokenGrant,
        client: &EngineClient,
        user: &OAuthUser,
    ) -> AppResult<IssuedToken> {
        let scopes = self.scopes.normalize_scopes(token.scope.as_deref());

        self.tokens
            .create(Token {
                token: token.access_token.clone(),
                token_type: TokenType::AccessToken,
                status: TokenStatus::Activated,
                client_id: client.row_id()?,
                user_id: Some(user.id.clone()),
                scopes: scopes.clone(),
                details: json!({ "expires_at": token.access_token_expires_at }),
            })
            .await?;

        info!(
            client_id = %client.client_id,
            user_id = %user.id,
            scopes = scopes.len(),
            "Access token issued"
        );

        Ok(IssuedToken {
            access_token: token.access_token,
            access_token_expires_at: token.access_token_expires_at,
            scope: scopes,
            client: client.clone(),
            user: user.clone(),
        })
    }

    /// Load an activated token row with its client and scope-gated user data
    ///
    /// # Errors
    ///
    /// - `ResourceNotFound` if the token, its user or its client is missing
    /// - `InvalidState` if the token is not activated
    pub async fn get_token(&self, kind: TokenType, token: &str) -> AppResult<ResolvedToken> {
        let row = self
            .tokens
            .find_one(
                &Filter::new()
                    .where_eq("token", token)
                    .where_eq("type", kind.as_str()),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Token"))?;

        if !row.is_activated() {
            return Err(AppError::invalid_state(format!(
                "Token is {:?}, expected activated",
                row.status
            )));
        }

        let user = match &row.user_id {
            Some(user_id) => {
                let fetch = self
                    .fetcher
                    .fetch_by_scopes(FetchRequest::new(
                        user_id.clone(),
                        self.scopes.normalize_scopes(&row.scopes),
                    ))
                    .await;
                match fetch {
                    UserFetch::Degraded {
                        reason: DegradedReason::NotFound,
                        ..
                    } => return Err(AppError::not_found("User")),
                    UserFetch::Degraded { payload, reason } => {
                        warn!(user_id = %user_id, reason = %reason, "Serving degraded user data");
                        Some(payload)
                    }
                    UserFetch::Full(payload) => Some(payload),
                }
            }
            None => None,
        };

        let client = self.find_client_by_row_id(row.client_id).await?;

        Ok(ResolvedToken {
            token: row,
            client,
            user,
        })
    }

    /// Verify a signed access token and re-resolve its client
    ///
    /// The token row is never read.
    ///
    /// # Errors
    ///
    /// - `AuthInvalid` if the signature is invalid or the token carries no client
    /// - `ResourceNotFound` if the client no longer exists
    pub async fn get_access_token(&self, access_token: &str) -> AppResult<AccessTokenInfo> {
        let payload = self.signer.verify(TokenType::AccessToken, access_token)?;

        if payload.client_id.is_empty() || payload.client_id == NO_CLIENT {
            return Err(AppError::auth_invalid("Access token is not bound to a client"));
        }

        let client = self.find_client(&payload.client_id).await?;

        Ok(AccessTokenInfo {
            access_token: access_token.to_owned(),
            scope: payload.scopes,
            client: EngineClient::from(&client),
            user: OAuthUser {
                id: payload.user_id,
                subject_id: payload.subject_id,
                roles: payload.roles,
                provider: payload.provider,
                profile: None,
            },
        })
    }

    /// Whether a token carries every required scope
    #[must_use]
    pub fn verify_scope(&self, token: &AccessTokenInfo, required: impl Into<RawScopes>) -> bool {
        let required = self.scopes.normalize_scopes(required);
        if required.is_empty() {
            return true;
        }
        let granted = self.scopes.normalize_scopes(&token.scope);
        required.iter().all(|scope| granted.contains(scope))
    }

    /// Expiry of an access token signed now
    ///
    /// # Errors
    ///
    /// Returns an `InternalError` if the signer lifetime overflows the clock
    pub fn access_token_expiry(&self) -> AppResult<chrono::DateTime<Utc>> {
        Utc::now()
            .checked_add_signed(self.signer.lifetime())
            .ok_or_else(|| AppError::internal("Access token lifetime overflows the clock"))
    }
}

/// Operations the protocol engine needs from every grant handler
#[async_trait]
pub trait OAuth2Model: Send + Sync {
    /// Shared handler state
    fn core(&self) -> &HandlerCore;

    /// Client lookup, optionally authenticated by secret
    ///
    /// # Errors
    ///
    /// Returns a `ResourceNotFound` error if the client is absent
    async fn get_client(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> AppResult<EngineClient> {
        self.core().get_client(client_id, client_secret).await
    }

    /// Sign an access token
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails
    async fn generate_access_token(
        &self,
        client: &EngineClient,
        user: &OAuthUser,
        scopes: &[String],
    ) -> AppResult<String> {
        self.core().generate_access_token(client, user, scopes)
    }

    /// Persist an activated access token
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails
    async fn save_token(
        &self,
        token: AccessTokenGrant,
        client: &EngineClient,
        user: &OAuthUser,
    ) -> AppResult<IssuedToken> {
        self.core().save_token(token, client, user).await
    }

    /// Verify a bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or its client is gone
    async fn get_access_token(&self, access_token: &str) -> AppResult<AccessTokenInfo> {
        self.core().get_access_token(access_token).await
    }

    /// Whether a token carries every required scope
    ///
    /// # Errors
    ///
    /// Never fails for the built-in handlers
    async fn verify_scope(&self, token: &AccessTokenInfo, required: &[String]) -> AppResult<bool> {
        Ok(self.core().verify_scope(token, required))
    }
}
