// ABOUTME: Shared test utilities and fixtures for integration tests
// ABOUTME: Sample catalogue, in-memory repositories, a test protocol engine and network doubles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `warden_oauth2`

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use warden_core::models::{
    Client, OAuthUser, RelationKind, RelationScopeDefinition, ScopeCatalogue, ScopeDefinition,
    Token, TokenType,
};
use warden_oauth2::auth::InMemoryUserAuthService;
use warden_oauth2::constants::oauth2::{grants, BEARER};
use warden_oauth2::crypto::JwtTokenSigner;
use warden_oauth2::errors::{AppError, AppResult};
use warden_oauth2::network::{NetworkClient, NetworkRequest, NetworkResponse};
use warden_oauth2::oauth2_server::{
    AccessTokenGrant, AuthorizationCodeGrant, AuthorizationCodeModel, AuthorizationCodeRequest,
    AuthorizeRequest, ClientCredentialsModel, EngineClient, Handlers, OAuth2Model, PasswordModel,
    ProtocolEngine, TokenRequest, TokenResponse,
};
use warden_oauth2::repository::{Filter, InMemoryRepository, Repository, UserRecord};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Catalogue and rows
// ============================================================================

pub const USER_ID: &str = "u-1";
pub const USERNAME: &str = "ada";
pub const PASSWORD: &str = "correct horse";
pub const CLIENT_ID: &str = "web-app";
pub const CLIENT_SECRET: &str = "s3cret";
pub const REDIRECT_URL: &str = "https://app.example/callback";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

pub fn sample_catalogue() -> ScopeCatalogue {
    let mut aliases = BTreeMap::new();
    aliases.insert("fullName".to_owned(), strings(&["firstName", "lastName"]));

    ScopeCatalogue {
        scopes: vec![
            ScopeDefinition {
                identifier: "basic".to_owned(),
                name: "Basic information".to_owned(),
                description: Some("Email and username".to_owned()),
                fields: strings(&["id", "email", "username"]),
                relations: Vec::new(),
            },
            ScopeDefinition {
                identifier: "personal".to_owned(),
                name: "Personal details".to_owned(),
                description: None,
                fields: strings(&["birthDate"]),
                relations: vec![RelationScopeDefinition {
                    relation: "profile".to_owned(),
                    kind: RelationKind::HasOne,
                    fields: strings(&["firstName", "lastName", "bio"]),
                    group_by: None,
                    foreign_key: None,
                }],
            },
            ScopeDefinition {
                identifier: "identifiers".to_owned(),
                name: "Identifiers".to_owned(),
                description: None,
                fields: Vec::new(),
                relations: vec![RelationScopeDefinition {
                    relation: "identifiers".to_owned(),
                    kind: RelationKind::HasMany,
                    fields: strings(&["value", "verified"]),
                    group_by: Some("identifierType".to_owned()),
                    foreign_key: None,
                }],
            },
        ],
        default_scopes: strings(&["user:read:basic"]),
        aliases,
    }
}

pub fn sample_user() -> UserRecord {
    json!({
        "id": USER_ID,
        "email": "ada@example.com",
        "username": USERNAME,
        "birthDate": "1815-12-10",
        "password": "never-exposed",
        "settings": { "theme": "dark" },
        "profile": {
            "id": 11,
            "user_id": USER_ID,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "bio": "Analyst"
        },
        "identifiers": [
            { "id": 21, "user_id": USER_ID, "identifierType": "email", "value": "a@x.com", "verified": true },
            { "id": 22, "user_id": USER_ID, "identifierType": "phone", "value": "555", "verified": false }
        ]
    })
    .as_object()
    .cloned()
    .unwrap()
}

pub fn sample_client() -> Client {
    Client {
        id: 1,
        client_id: CLIENT_ID.to_owned(),
        client_secret: Some(CLIENT_SECRET.to_owned()),
        grants: strings(&[
            grants::AUTHORIZATION_CODE,
            grants::PASSWORD,
            grants::CLIENT_CREDENTIALS,
        ]),
        redirect_uris: strings(&[REDIRECT_URL]),
        callback_urls: Vec::new(),
    }
}

pub fn sample_auth_service() -> InMemoryUserAuthService {
    InMemoryUserAuthService::new()
        .with_user(
            USERNAME,
            PASSWORD,
            OAuthUser::new(USER_ID, "local").with_roles(strings(&["member"])),
        )
        .unwrap()
}

pub fn sample_oauth_user() -> OAuthUser {
    OAuthUser::new(USER_ID, "local").with_roles(strings(&["member"]))
}

// ============================================================================
// Repository doubles
// ============================================================================

/// Repository whose every call fails
pub struct FailingRepository<E> {
    _entity: PhantomData<fn() -> E>,
}

impl<E> Default for FailingRepository<E> {
    fn default() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Send + Sync + 'static> Repository<E> for FailingRepository<E> {
    async fn find_one(&self, _filter: &Filter) -> AppResult<Option<E>> {
        Err(AppError::external_service("database", "connection refused"))
    }

    async fn create(&self, _entity: E) -> AppResult<E> {
        Err(AppError::external_service("database", "connection refused"))
    }
}

// ============================================================================
// Handler harness
// ============================================================================

pub struct TestHarness {
    pub handlers: Arc<Handlers>,
    pub clients: Arc<InMemoryRepository<Client>>,
    pub tokens: Arc<InMemoryRepository<Token>>,
    pub users: Arc<InMemoryRepository<UserRecord>>,
    pub signer: Arc<JwtTokenSigner>,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_clients(vec![sample_client()]).await
    }

    pub async fn with_clients(clients: Vec<Client>) -> Self {
        init_test_logging();
        let clients = Arc::new(InMemoryRepository::with_rows(clients).unwrap());
        let tokens = Arc::new(InMemoryRepository::<Token>::new());
        let users = Arc::new(InMemoryRepository::with_rows([sample_user()]).unwrap());
        let signer = Arc::new(JwtTokenSigner::new(
            b"test-signing-secret",
            chrono::Duration::minutes(10),
        ));

        let handlers = Handlers::builder()
            .with_scope_source(warden_oauth2::oauth2_server::ScopeSource::Catalogue(
                sample_catalogue(),
            ))
            .with_clients(clients.clone())
            .with_tokens(tokens.clone())
            .with_users(users.clone())
            .with_signer(signer.clone())
            .with_auth_service(Arc::new(sample_auth_service()))
            .build()
            .await
            .unwrap();

        Self {
            handlers: Arc::new(handlers),
            clients,
            tokens,
            users,
            signer,
        }
    }

    pub fn engine(&self) -> TestProtocolEngine {
        TestProtocolEngine {
            handlers: Arc::clone(&self.handlers),
        }
    }

    pub async fn issue_code(&self, scope: &str) -> AuthorizationCodeGrant {
        self.engine()
            .authorize(AuthorizeRequest {
                response_type: "code".to_owned(),
                client_id: CLIENT_ID.to_owned(),
                redirect_uri: REDIRECT_URL.to_owned(),
                scope: Some(scope.to_owned()),
                state: None,
                user: sample_oauth_user(),
            })
            .await
            .unwrap()
    }
}

// ============================================================================
// Protocol engine double
// ============================================================================

/// Minimal engine driving the grant handlers the way a wire-level engine would
pub struct TestProtocolEngine {
    pub handlers: Arc<Handlers>,
}

impl TestProtocolEngine {
    async fn issue<M: OAuth2Model + ?Sized>(
        &self,
        model: &M,
        client: &EngineClient,
        user: &OAuthUser,
        scopes: &[String],
        with_user_data: bool,
    ) -> AppResult<TokenResponse> {
        let access_token = model.generate_access_token(client, user, scopes).await?;
        let issued = model
            .save_token(
                AccessTokenGrant {
                    access_token,
                    access_token_expires_at: self.handlers.core.access_token_expiry()?,
                    scope: Some(scopes.join(" ")),
                },
                client,
                user,
            )
            .await?;

        let user_data = if with_user_data {
            self.handlers
                .core
                .get_token(TokenType::AccessToken, &issued.access_token)
                .await?
                .user
        } else {
            None
        };

        Ok(TokenResponse {
            access_token: issued.access_token,
            token_type: BEARER.to_owned(),
            expires_in: self.handlers.core.access_token_lifetime().num_seconds(),
            scope: (!issued.scope.is_empty()).then(|| issued.scope.join(" ")),
            user: user_data,
        })
    }
}

#[async_trait]
impl ProtocolEngine for TestProtocolEngine {
    async fn authorize(&self, request: AuthorizeRequest) -> AppResult<AuthorizationCodeGrant> {
        let handler = &self.handlers.authorization_code;
        let client = handler.get_client(&request.client_id, None).await?;
        if !client.redirect_uris.contains(&request.redirect_uri) {
            return Err(AppError::invalid_input("redirect_uri mismatch"));
        }

        handler
            .save_authorization_code(
                AuthorizationCodeRequest {
                    authorization_code: Uuid::new_v4().simple().to_string(),
                    expires_at: Utc::now() + self.handlers.core.auth_code_lifetime(),
                    redirect_uri: request.redirect_uri,
                    scope: request.scope,
                },
                &client,
                &request.user,
            )
            .await
    }

    async fn token(&self, request: TokenRequest) -> AppResult<TokenResponse> {
        match request.grant_type.as_str() {
            grants::AUTHORIZATION_CODE => {
                let handler = self.handlers.authorization_code.as_ref();
                let client = handler
                    .get_client(&request.client_id, request.client_secret.as_deref())
                    .await?;
                let code = request
                    .code
                    .as_deref()
                    .ok_or_else(|| AppError::invalid_input("code is required"))?;
                let grant = handler.get_authorization_code(code).await?;
                if grant.client.client_id != client.client_id
                    || request.redirect_uri.as_deref() != Some(grant.redirect_uri.as_str())
                {
                    return Err(AppError::invalid_state("code was issued to another client"));
                }
                handler.revoke_authorization_code(&grant).await?;
                self.issue(handler, &client, &grant.user, &grant.scope, true)
                    .await
            }
            grants::PASSWORD => {
                let handler = self.handlers.password.as_ref();
                let client = handler
                    .get_client(&request.client_id, request.client_secret.as_deref())
                    .await?;
                let user = handler
                    .get_user(
                        request.username.as_deref().unwrap_or_default(),
                        request.password.as_deref().unwrap_or_default(),
                        &client,
                    )
                    .await?;
                let scopes = handler
                    .core()
                    .scope_manager()
                    .validate_scopes(request.scope.as_deref())
                    .granted_scopes;
                self.issue(handler, &client, &user, &scopes, true).await
            }
            grants::CLIENT_CREDENTIALS => {
                let handler = self.handlers.client_credentials.as_ref();
                let client = handler
                    .get_client(&request.client_id, request.client_secret.as_deref())
                    .await?;
                let user = handler.get_user_from_client(&client).await?;
                self.issue(handler, &client, &user, &[], false).await
            }
            other => Err(AppError::invalid_input(format!(
                "unsupported grant type {other}"
            ))),
        }
    }
}

// ============================================================================
// Network double
// ============================================================================

/// Records deliveries and the peak number of concurrent requests
pub struct RecordingNetworkClient {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
    pub requests: Mutex<Vec<NetworkRequest>>,
}

impl RecordingNetworkClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl NetworkClient for RecordingNetworkClient {
    async fn send(&self, request: NetworkRequest) -> AppResult<NetworkResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if request.url.contains("fail") {
            return Err(AppError::external_service(&request.url, "Unexpected status 500"));
        }
        Ok(NetworkResponse {
            status: 200,
            data: json!({ "ok": true }),
        })
    }
}
