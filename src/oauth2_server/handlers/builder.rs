// ABOUTME: Async builder assembling fully initialized grant handlers
// ABOUTME: Loads the scope catalogue once and shares the ScopeManager across handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use tracing::info;
use warden_core::models::{Client, ScopeCatalogue, Token};

use super::authorization_code::AuthorizationCodeHandler;
use super::client_credentials::ClientCredentialsHandler;
use super::core::HandlerCore;
use super::password::PasswordHandler;
use crate::auth::UserAuthService;
use crate::config::ServiceConfig;
use crate::constants::oauth2::DEFAULT_AUTH_CODE_TTL_SECS;
use crate::crypto::{JwtTokenSigner, TokenSigner};
use crate::errors::{AppError, AppResult};
use crate::repository::{Repository, UserRecord};
use crate::scopes::ScopeManager;
use crate::user_data::UserDataFetcher;

/// Where the scope catalogue comes from
pub enum ScopeSource {
    /// Already built
    Manager(Arc<ScopeManager>),
    /// Catalogue file loaded at build time
    File(PathBuf),
    /// In-memory catalogue validated at build time
    Catalogue(ScopeCatalogue),
}

/// Fully initialized grant handlers sharing one core
pub struct Handlers {
    /// Shared handler state
    pub core: Arc<HandlerCore>,
    /// `authorization_code` grant
    pub authorization_code: Arc<AuthorizationCodeHandler>,
    /// `password` grant
    pub password: Arc<PasswordHandler>,
    /// `client_credentials` grant
    pub client_credentials: Arc<ClientCredentialsHandler>,
}

impl Handlers {
    /// Create a builder
    #[must_use]
    pub fn builder() -> HandlerBuilder {
        HandlerBuilder::new()
    }

    /// Scope manager shared by every handler
    #[must_use]
    pub fn scope_manager(&self) -> &Arc<ScopeManager> {
        self.core.scope_manager()
    }
}

/// Builder for [`Handlers`]
pub struct HandlerBuilder {
    scopes: Option<ScopeSource>,
    clients: Option<Arc<dyn Repository<Client>>>,
    tokens: Option<Arc<dyn Repository<Token>>>,
    users: Option<Arc<dyn Repository<UserRecord>>>,
    signer: Option<Arc<dyn TokenSigner>>,
    auth: Option<Arc<dyn UserAuthService>>,
    auth_code_lifetime: Duration,
}

impl Default for HandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerBuilder {
    /// Empty builder with the default authorization code lifetime
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: None,
            clients: None,
            tokens: None,
            users: None,
            signer: None,
            auth: None,
            auth_code_lifetime: Duration::seconds(DEFAULT_AUTH_CODE_TTL_SECS),
        }
    }

    /// Builder preset from service configuration: catalogue file, JWT signer and lifetimes
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error if a configured lifetime is out of range
    pub fn from_config(config: &ServiceConfig) -> AppResult<Self> {
        let access_lifetime =
            lifetime_from_secs("access token", config.tokens.access_token_ttl_secs)?;
        let auth_code_lifetime =
            lifetime_from_secs("authorization code", config.tokens.auth_code_ttl_secs)?;
        let signer = JwtTokenSigner::new(config.tokens.signing_secret.as_bytes(), access_lifetime);
        Ok(Self::new()
            .with_scope_source(ScopeSource::File(config.scope_catalogue_path.clone()))
            .with_signer(Arc::new(signer))
            .with_auth_code_lifetime(auth_code_lifetime))
    }

    /// Set the scope catalogue source
    #[must_use]
    pub fn with_scope_source(mut self, source: ScopeSource) -> Self {
        self.scopes = Some(source);
        self
    }

    /// Use an already built scope manager
    #[must_use]
    pub fn with_scope_manager(self, manager: Arc<ScopeManager>) -> Self {
        self.with_scope_source(ScopeSource::Manager(manager))
    }

    /// Set the client repository
    #[must_use]
    pub fn with_clients(mut self, clients: Arc<dyn Repository<Client>>) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Set the token repository
    #[must_use]
    pub fn with_tokens(mut self, tokens: Arc<dyn Repository<Token>>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the user repository
    #[must_use]
    pub fn with_users(mut self, users: Arc<dyn Repository<UserRecord>>) -> Self {
        self.users = Some(users);
        self
    }

    /// Set the access token signer
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn TokenSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Set the application auth service
    #[must_use]
    pub fn with_auth_service(mut self, auth: Arc<dyn UserAuthService>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the authorization code lifetime
    #[must_use]
    pub const fn with_auth_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.auth_code_lifetime = lifetime;
        self
    }

    /// Load the catalogue and assemble the handlers
    ///
    /// # Errors
    ///
    /// Returns an error if a collaborator is missing or the catalogue fails to load or validate
    pub async fn build(self) -> AppResult<Handlers> {
        let source = self.scopes.ok_or_else(|| required("Scope catalogue"))?;
        let clients = self.clients.ok_or_else(|| required("Client repository"))?;
        let tokens = self.tokens.ok_or_else(|| required("Token repository"))?;
        let users = self.users.ok_or_else(|| required("User repository"))?;
        let signer = self.signer.ok_or_else(|| required("Token signer"))?;
        let auth = self.auth.ok_or_else(|| required("User auth service"))?;

        let scopes = match source {
            ScopeSource::Manager(manager) => manager,
            ScopeSource::File(path) => Arc::new(ScopeManager::load(path).await?),
            ScopeSource::Catalogue(catalogue) => Arc::new(ScopeManager::from_catalogue(catalogue)?),
        };

        let fetcher = Arc::new(UserDataFetcher::new(Arc::clone(&scopes), users));
        let core = Arc::new(HandlerCore {
            scopes,
            fetcher,
            clients,
            tokens,
            signer,
            auth_code_lifetime: self.auth_code_lifetime,
        });

        info!(
            auth_code_ttl_secs = core.auth_code_lifetime.num_seconds(),
            access_token_ttl_secs = core.access_token_lifetime().num_seconds(),
            "OAuth2 grant handlers initialized"
        );

        Ok(Handlers {
            authorization_code: Arc::new(AuthorizationCodeHandler::new(Arc::clone(&core))),
            password: Arc::new(PasswordHandler::new(Arc::clone(&core), Arc::clone(&auth))),
            client_credentials: Arc::new(ClientCredentialsHandler::new(Arc::clone(&core), auth)),
            core,
        })
    }
}

fn lifetime_from_secs(what: &str, secs: i64) -> AppResult<Duration> {
    Duration::try_seconds(secs).ok_or_else(|| {
        AppError::config(format!("{what} lifetime of {secs} seconds is out of range"))
    })
}

fn required(what: &str) -> AppError {
    AppError::config(format!("{what} is required to build the OAuth2 handlers"))
}
