// ABOUTME: OAuth2 orchestration: client tokens, sign-in redirect, code exchange and webhooks
// ABOUTME: Drives the protocol engine in sequence and fans client callbacks out with a bound
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # OAuth2 Service
//!
//! Browser flow:
//! 1. [`OAuth2Service::get_oauth2_request_path`] mints an encrypted client
//!    token and points the browser at the sign-in page
//! 2. [`OAuth2Service::do_oauth2`] authenticates the user, obtains an
//!    authorization code from the engine and exchanges it for an access token
//!
//! [`OAuth2Service::do_client_callback`] notifies every callback URL a client
//! registered.

use std::fmt;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::form_urlencoded;
use warden_core::models::Client;
use zeroize::Zeroizing;

use crate::auth::{SignInCredentials, UserAuthService};
use crate::config::ServiceConfig;
use crate::constants::callbacks::{CLIENT_ID_HEADER, DEFAULT_CONCURRENCY};
use crate::constants::oauth2::{grants, DEFAULT_SIGN_IN_PATH};
use crate::crypto::SymmetricCipher;
use crate::errors::{AppError, AppResult};
use crate::network::{NetworkClient, NetworkRequest};
use crate::oauth2_server::{AuthorizeRequest, ProtocolEngine, TokenRequest, TokenResponse};
use crate::repository::{Filter, Repository};
use crate::scopes::{normalize_scopes, RawScopes};

/// Credentials wrapped into the opaque client token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientToken {
    /// Public client ID
    pub client_id: String,
    /// Client secret, when the client has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl fmt::Debug for ClientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientToken")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Service settings
#[derive(Clone)]
pub struct OAuth2ServiceSettings {
    /// Secret for the client token cipher
    pub client_token_secret: Zeroizing<String>,
    /// Sign-in page path
    pub sign_in_path: String,
    /// Maximum webhook deliveries in flight
    pub callback_concurrency: usize,
}

impl OAuth2ServiceSettings {
    /// Settings with default path and concurrency
    #[must_use]
    pub fn new(client_token_secret: impl Into<String>) -> Self {
        Self {
            client_token_secret: Zeroizing::new(client_token_secret.into()),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_owned(),
            callback_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Settings from service configuration
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            client_token_secret: config.client_tokens.secret.clone(),
            sign_in_path: config.client_tokens.sign_in_path.clone(),
            callback_concurrency: config.callbacks.concurrency,
        }
    }

    /// Override the callback concurrency limit; zero is raised to one
    #[must_use]
    pub fn with_callback_concurrency(mut self, concurrency: usize) -> Self {
        self.callback_concurrency = concurrency.max(1);
        self
    }

    /// Override the sign-in path
    #[must_use]
    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }
}

impl fmt::Debug for OAuth2ServiceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2ServiceSettings")
            .field("client_token_secret", &"[REDACTED]")
            .field("sign_in_path", &self.sign_in_path)
            .field("callback_concurrency", &self.callback_concurrency)
            .finish()
    }
}

/// Result of a completed browser flow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OAuth2Outcome {
    /// Where the browser goes next
    pub redirect_url: String,
    /// Token issued by the engine
    pub token_response: TokenResponse,
}

/// Outcome of one webhook delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackDelivery {
    /// Callback URL
    pub url: String,
    /// HTTP status on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallbackDelivery {
    /// Whether the delivery succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-URL results of a callback fan-out, in completion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallbackReport {
    /// One entry per callback URL
    pub deliveries: Vec<CallbackDelivery>,
}

impl CallbackReport {
    /// Number of successful deliveries
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.is_success()).count()
    }

    /// Failed deliveries
    pub fn failures(&self) -> impl Iterator<Item = &CallbackDelivery> {
        self.deliveries.iter().filter(|d| !d.is_success())
    }
}

/// Top-level OAuth2 orchestrator
pub struct OAuth2Service {
    engine: Arc<dyn ProtocolEngine>,
    clients: Arc<dyn Repository<Client>>,
    cipher: Arc<dyn SymmetricCipher>,
    auth: Arc<dyn UserAuthService>,
    network: Arc<dyn NetworkClient>,
    settings: OAuth2ServiceSettings,
}

impl OAuth2Service {
    /// Create the service
    #[must_use]
    pub fn new(
        engine: Arc<dyn ProtocolEngine>,
        clients: Arc<dyn Repository<Client>>,
        cipher: Arc<dyn SymmetricCipher>,
        auth: Arc<dyn UserAuthService>,
        network: Arc<dyn NetworkClient>,
        settings: OAuth2ServiceSettings,
    ) -> Self {
        Self {
            engine,
            clients,
            cipher,
            auth,
            network,
            settings,
        }
    }

    async fn find_client(&self, client_id: &str) -> AppResult<Client> {
        self.clients
            .find_one(&Filter::new().where_eq("client_id", client_id))
            .await?
            .ok_or_else(|| AppError::not_found("Client"))
    }

    /// Encrypt client credentials into an opaque token
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or encryption fails
    pub fn encrypt_client_token(&self, token: &ClientToken) -> AppResult<String> {
        let plaintext = Zeroizing::new(serde_json::to_string(token)?);
        self.cipher
            .encrypt(&plaintext, &self.settings.client_token_secret)
    }

    /// Decrypt a client token
    ///
    /// # Errors
    ///
    /// Returns a `DecryptionFailed` error if the token is corrupt, forged or
    /// does not carry client credentials
    pub fn decrypt_client_token(&self, token: &str) -> AppResult<ClientToken> {
        let plaintext = Zeroizing::new(
            self.cipher
                .decrypt(token, &self.settings.client_token_secret)?,
        );
        serde_json::from_str(&plaintext)
            .map_err(|_| AppError::decryption("Client token does not carry client credentials"))
    }

    /// Sign-in page path for a client and redirect URL
    ///
    /// Fails closed: the redirect URL must be registered before a token is minted.
    ///
    /// # Errors
    ///
    /// - `ResourceNotFound` if the client does not exist
    /// - `InvalidInput` if the redirect URL is not registered
    pub async fn get_oauth2_request_path(
        &self,
        client_id: &str,
        redirect_url: &str,
    ) -> AppResult<String> {
        let client = self.find_client(client_id).await?;
        if !client.has_redirect_uri(redirect_url) {
            warn!(client_id, redirect_url, "Rejected unregistered redirect URL");
            return Err(AppError::invalid_input(format!(
                "Redirect URL '{redirect_url}' is not registered for client '{client_id}'"
            )));
        }

        let token = self.encrypt_client_token(&ClientToken {
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
        })?;

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("token", &token)
            .append_pair("redirectUrl", redirect_url)
            .finish();

        debug!(client_id, "Minted sign-in request path");
        Ok(format!("{}?{query}", self.settings.sign_in_path))
    }

    /// Complete the browser flow: sign-in, authorization code, token exchange
    ///
    /// Stages run strictly in sequence; any failure aborts the flow.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` if the client token is invalid
    /// - `InvalidInput` if the redirect URL is not registered
    /// - `AuthInvalid` if the user credentials are rejected
    /// - `InvalidState` if the client has no secret to exchange the code with
    /// - any error raised by the protocol engine
    pub async fn do_oauth2(
        &self,
        sign_in: SignInCredentials,
        redirect_url: &str,
        scopes: impl Into<RawScopes> + Send,
    ) -> AppResult<OAuth2Outcome> {
        let client_token = self.decrypt_client_token(&sign_in.client_token)?;
        let client = self.find_client(&client_token.client_id).await?;
        if !client.has_redirect_uri(redirect_url) {
            return Err(AppError::invalid_input(format!(
                "Redirect URL '{redirect_url}' is not registered for client '{}'",
                client.client_id
            )));
        }

        let user = self
            .auth
            .authenticate(&sign_in.username, &sign_in.password, Some(&client))
            .await?;

        let scopes = normalize_scopes(scopes);
        let grant = self
            .engine
            .authorize(AuthorizeRequest {
                response_type: "code".to_owned(),
                client_id: client.client_id.clone(),
                redirect_uri: redirect_url.to_owned(),
                scope: (!scopes.is_empty()).then(|| scopes.join(" ")),
                state: None,
                user,
            })
            .await?;

        let client_secret = client
            .client_secret
            .clone()
            .ok_or_else(|| AppError::invalid_state("Client has no secret for the code exchange"))?;

        let token_response = self
            .engine
            .token(TokenRequest {
                grant_type: grants::AUTHORIZATION_CODE.to_owned(),
                code: Some(grant.authorization_code),
                redirect_uri: Some(redirect_url.to_owned()),
                client_id: client.client_id.clone(),
                client_secret: Some(client_secret),
                ..TokenRequest::default()
            })
            .await?;

        info!(client_id = %client.client_id, "OAuth2 sign-in flow completed");

        Ok(OAuth2Outcome {
            redirect_url: redirect_url.to_owned(),
            token_response,
        })
    }

    /// POST a payload to every callback URL of a client
    ///
    /// At most `callback_concurrency` requests are in flight. A failed delivery
    /// is logged and reported without stopping the others.
    ///
    /// # Errors
    ///
    /// Returns a `ResourceNotFound` error if the client does not exist
    pub async fn do_client_callback(
        &self,
        client_id: &str,
        payload: Value,
    ) -> AppResult<CallbackReport> {
        let client = self.find_client(client_id).await?;
        if client.callback_urls.is_empty() {
            debug!(client_id, "Client has no callback URLs");
            return Ok(CallbackReport::default());
        }

        let payload = &payload;
        let client_id = client.client_id.as_str();
        let deliveries: Vec<CallbackDelivery> = stream::iter(client.callback_urls.iter())
            .map(|url| async move {
                let request = NetworkRequest::post_json(url.clone(), payload.clone())
                    .with_header(CLIENT_ID_HEADER, client_id);
                match self.network.send(request).await {
                    Ok(response) => CallbackDelivery {
                        url: url.clone(),
                        status: Some(response.status),
                        error: None,
                    },
                    Err(e) => {
                        warn!(client_id, url = %url, error = %e, "Client callback failed");
                        CallbackDelivery {
                            url: url.clone(),
                            status: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .buffer_unordered(self.settings.callback_concurrency.max(1))
            .collect()
            .await;

        let report = CallbackReport { deliveries };
        info!(
            client_id,
            delivered = report.delivered(),
            total = report.deliveries.len(),
            "Client callbacks dispatched"
        );
        Ok(report)
    }
}
