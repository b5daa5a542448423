// ABOUTME: Integration tests for the OAuth2 grant handlers driven through a test protocol engine
// ABOUTME: Covers authorization code, password and client credentials grants plus token checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{
    sample_catalogue, sample_oauth_user, TestHarness, CLIENT_ID, CLIENT_SECRET, PASSWORD,
    REDIRECT_URL, USERNAME, USER_ID,
};
use serde_json::json;
use warden_core::models::{Client, Token, TokenStatus, TokenType};
use warden_oauth2::constants::oauth2::{grants, NO_CLIENT};
use warden_oauth2::crypto::{AccessTokenPayload, TokenSigner};
use warden_oauth2::errors::{ErrorCode, OAuth2Error};
use warden_oauth2::oauth2_server::{
    AuthorizationCodeModel, AuthorizationCodeRequest, ClientCredentialsModel, Handlers,
    OAuth2Model, PasswordModel, ProtocolEngine, ScopeSource, TokenRequest,
};
use warden_oauth2::repository::{InMemoryRepository, Repository};

fn code_exchange(code: &str) -> TokenRequest {
    TokenRequest {
        grant_type: grants::AUTHORIZATION_CODE.to_owned(),
        code: Some(code.to_owned()),
        redirect_uri: Some(REDIRECT_URL.to_owned()),
        client_id: CLIENT_ID.to_owned(),
        client_secret: Some(CLIENT_SECRET.to_owned()),
        ..TokenRequest::default()
    }
}

fn payload_for(client_id: &str, scopes: &[&str]) -> AccessTokenPayload {
    AccessTokenPayload {
        subject_id: USER_ID.to_owned(),
        user_id: USER_ID.to_owned(),
        roles: vec!["member".to_owned()],
        provider: "local".to_owned(),
        client_id: client_id.to_owned(),
        scopes: scopes.iter().map(|s| (*s).to_owned()).collect(),
    }
}

// ============================================================================
// Client lookup
// ============================================================================

#[tokio::test]
async fn test_get_client_checks_secret() {
    let harness = TestHarness::new().await;
    let handler = harness.handlers.authorization_code.as_ref();

    let client = handler.get_client(CLIENT_ID, None).await.unwrap();
    assert_eq!(client.id, "1");
    assert_eq!(client.row_id().unwrap(), 1);

    assert!(handler.get_client(CLIENT_ID, Some(CLIENT_SECRET)).await.is_ok());

    let wrong = handler.get_client(CLIENT_ID, Some("nope")).await.unwrap_err();
    assert_eq!(wrong.code, ErrorCode::ResourceNotFound);

    let unknown = handler.get_client("missing", None).await.unwrap_err();
    assert_eq!(unknown.code, ErrorCode::ResourceNotFound);
}

// ============================================================================
// Authorization code grant
// ============================================================================

#[tokio::test]
async fn test_save_authorization_code_persists_only_granted_scopes() {
    let harness = TestHarness::new().await;
    let grant = harness.issue_code("user:read:basic bogus:scope").await;

    assert_eq!(grant.scope, vec!["user:read:basic"]);
    assert_eq!(grant.client.client_id, CLIENT_ID);

    let rows = harness.tokens.all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].token_type, TokenType::AuthorizationCode);
    assert_eq!(rows[0].scopes, vec!["user:read:basic"]);
    assert_eq!(rows[0].user_id.as_deref(), Some(USER_ID));
}

#[tokio::test]
async fn test_get_authorization_code_rehydrates_grant() {
    let harness = TestHarness::new().await;
    let issued = harness.issue_code("user:read:basic").await;

    let grant = harness
        .handlers
        .authorization_code
        .get_authorization_code(&issued.authorization_code)
        .await
        .unwrap();

    assert_eq!(grant.redirect_uri, REDIRECT_URL);
    assert_eq!(grant.scope, vec!["user:read:basic"]);
    assert_eq!(grant.client.id, "1");
    assert_eq!(grant.user.id, USER_ID);
    assert_eq!(grant.user.roles, vec!["member"]);
    assert_eq!(grant.user.provider, "local");

    let profile = grant.user.profile.unwrap();
    assert_eq!(profile.get("email"), Some(&json!("ada@example.com")));
    assert!(profile.get("password").is_none());

    assert!(harness
        .handlers
        .authorization_code
        .revoke_authorization_code(&issued)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_expired_authorization_code_is_rejected() {
    let harness = TestHarness::new().await;
    let handler = harness.handlers.authorization_code.as_ref();
    let client = handler.get_client(CLIENT_ID, None).await.unwrap();

    handler
        .save_authorization_code(
            AuthorizationCodeRequest {
                authorization_code: "stale".to_owned(),
                expires_at: Utc::now() - Duration::seconds(5),
                redirect_uri: REDIRECT_URL.to_owned(),
                scope: Some("user:read:basic".to_owned()),
            },
            &client,
            &sample_oauth_user(),
        )
        .await
        .unwrap();

    let error = handler.get_authorization_code("stale").await.unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidState);
    assert_eq!(OAuth2Error::from(&error).error, "invalid_grant");
}

#[tokio::test]
async fn test_code_exchange_returns_scoped_user_data() {
    let harness = TestHarness::new().await;
    let engine = harness.engine();
    let grant = harness
        .issue_code("user:read:basic user:read:identifiers")
        .await;

    let response = engine
        .token(code_exchange(&grant.authorization_code))
        .await
        .unwrap();

    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, 600);
    assert_eq!(
        response.scope.as_deref(),
        Some("user:read:basic user:read:identifiers")
    );

    let user = response.user.unwrap();
    assert_eq!(user.get_str("email"), Some("ada@example.com"));
    assert_eq!(user.get_str("phone_value"), Some("555"));
    assert!(user.get("birthDate").is_none());

    let info = harness
        .handlers
        .authorization_code
        .get_access_token(&response.access_token)
        .await
        .unwrap();
    assert_eq!(info.client.client_id, CLIENT_ID);
    assert_eq!(info.user.id, USER_ID);
    assert_eq!(info.scope, vec!["user:read:basic", "user:read:identifiers"]);
}

#[tokio::test]
async fn test_code_exchange_with_wrong_secret_fails() {
    let harness = TestHarness::new().await;
    let grant = harness.issue_code("user:read:basic").await;

    let mut request = code_exchange(&grant.authorization_code);
    request.client_secret = Some("wrong".to_owned());

    let error = harness.engine().token(request).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

// ============================================================================
// Token rehydration
// ============================================================================

#[tokio::test]
async fn test_get_token_requires_activated_row() {
    let harness = TestHarness::new().await;
    harness
        .tokens
        .create(Token {
            token: "revoked-token".to_owned(),
            token_type: TokenType::AccessToken,
            status: TokenStatus::Revoked,
            client_id: 1,
            user_id: Some(USER_ID.to_owned()),
            scopes: vec!["user:read:basic".to_owned()],
            details: json!({}),
        })
        .await
        .unwrap();

    let error = harness
        .handlers
        .core
        .get_token(TokenType::AccessToken, "revoked-token")
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidState);

    let missing = harness
        .handlers
        .core
        .get_token(TokenType::AccessToken, "unknown")
        .await
        .unwrap_err();
    assert_eq!(missing.code, ErrorCode::ResourceNotFound);

    let wrong_kind = harness
        .handlers
        .core
        .get_token(TokenType::AuthorizationCode, "revoked-token")
        .await
        .unwrap_err();
    assert_eq!(wrong_kind.code, ErrorCode::ResourceNotFound);
}

#[test]
fn test_token_status_has_only_lifecycle_states() {
    assert_eq!(json!(TokenStatus::Activated), json!("activated"));
    assert_eq!(json!(TokenStatus::Revoked), json!("revoked"));
    // Expiry is carried by `expires_at`, never by the status column
    assert!(serde_json::from_value::<TokenStatus>(json!("expired")).is_err());
}

#[tokio::test]
async fn test_get_token_for_deleted_user_is_not_found() {
    let harness = TestHarness::new().await;
    harness
        .tokens
        .create(Token {
            token: "orphan".to_owned(),
            token_type: TokenType::AccessToken,
            status: TokenStatus::Activated,
            client_id: 1,
            user_id: Some("ghost".to_owned()),
            scopes: Vec::new(),
            details: json!({}),
        })
        .await
        .unwrap();

    let error = harness
        .handlers
        .core
        .get_token(TokenType::AccessToken, "orphan")
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
    assert!(error.message.contains("User"));
}

#[tokio::test]
async fn test_get_token_without_user_returns_client_only() {
    let harness = TestHarness::new().await;
    harness
        .tokens
        .create(Token {
            token: "machine".to_owned(),
            token_type: TokenType::AccessToken,
            status: TokenStatus::Activated,
            client_id: 1,
            user_id: None,
            scopes: Vec::new(),
            details: json!({}),
        })
        .await
        .unwrap();

    let resolved = harness
        .handlers
        .core
        .get_token(TokenType::AccessToken, "machine")
        .await
        .unwrap();
    assert!(resolved.user.is_none());
    assert_eq!(resolved.client.client_id, CLIENT_ID);
}

// ============================================================================
// Bearer token verification
// ============================================================================

#[tokio::test]
async fn test_get_access_token_rejects_unbound_and_tampered_tokens() {
    let harness = TestHarness::new().await;
    let handler = harness.handlers.password.as_ref();

    let unbound = harness
        .signer
        .generate(&payload_for(NO_CLIENT, &["user:read:basic"]))
        .unwrap();
    let error = handler.get_access_token(&unbound).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::AuthInvalid);

    let orphaned = harness
        .signer
        .generate(&payload_for("deleted-app", &["user:read:basic"]))
        .unwrap();
    let error = handler.get_access_token(&orphaned).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);

    let valid = harness
        .signer
        .generate(&payload_for(CLIENT_ID, &["user:read:basic"]))
        .unwrap();
    let tampered = format!("{valid}x");
    let error = handler.get_access_token(&tampered).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::AuthInvalid);
}

#[tokio::test]
async fn test_verify_scope_requires_every_scope() {
    let harness = TestHarness::new().await;
    let handler = harness.handlers.password.as_ref();
    let token = harness
        .signer
        .generate(&payload_for(
            CLIENT_ID,
            &["user:read:basic", "user:read:identifiers"],
        ))
        .unwrap();
    let info = handler.get_access_token(&token).await.unwrap();

    let scopes = |values: &[&str]| values.iter().map(|v| (*v).to_owned()).collect::<Vec<_>>();
    assert!(handler.verify_scope(&info, &[]).await.unwrap());
    assert!(handler
        .verify_scope(&info, &scopes(&["user:read:basic"]))
        .await
        .unwrap());
    assert!(handler
        .verify_scope(&info, &scopes(&["user:read:identifiers", "user:read:basic"]))
        .await
        .unwrap());
    assert!(!handler
        .verify_scope(&info, &scopes(&["user:read:basic", "user:read:personal"]))
        .await
        .unwrap());
    assert!(harness
        .handlers
        .core
        .verify_scope(&info, "user:read:basic  user:read:basic"));
}

// ============================================================================
// Password and client credentials grants
// ============================================================================

#[tokio::test]
async fn test_password_grant() {
    let harness = TestHarness::new().await;
    let engine = harness.engine();

    let response = engine
        .token(TokenRequest {
            grant_type: grants::PASSWORD.to_owned(),
            client_id: CLIENT_ID.to_owned(),
            client_secret: Some(CLIENT_SECRET.to_owned()),
            username: Some(USERNAME.to_owned()),
            password: Some(PASSWORD.to_owned()),
            scope: Some("user:read:personal user:read:unknown".to_owned()),
            ..TokenRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(response.scope.as_deref(), Some("user:read:personal"));
    let user = response.user.unwrap();
    assert_eq!(user.get_str("profile_firstName"), Some("Ada"));
    assert_eq!(user.get_str("birthDate"), Some("1815-12-10"));

    let error = engine
        .token(TokenRequest {
            grant_type: grants::PASSWORD.to_owned(),
            client_id: CLIENT_ID.to_owned(),
            username: Some(USERNAME.to_owned()),
            password: Some("wrong".to_owned()),
            ..TokenRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::AuthInvalid);
}

#[tokio::test]
async fn test_password_handler_get_user() {
    let harness = TestHarness::new().await;
    let handler = harness.handlers.password.as_ref();
    let client = handler.get_client(CLIENT_ID, None).await.unwrap();

    let user = handler.get_user(USERNAME, PASSWORD, &client).await.unwrap();
    assert_eq!(user.id, USER_ID);
    assert_eq!(user.roles, vec!["member"]);
}

#[tokio::test]
async fn test_client_credentials_grant() {
    let harness = TestHarness::new().await;
    let handler = harness.handlers.client_credentials.as_ref();
    let client = handler.get_client(CLIENT_ID, Some(CLIENT_SECRET)).await.unwrap();

    let user = handler.get_user_from_client(&client).await.unwrap();
    assert_eq!(user.id, CLIENT_ID);
    assert_eq!(user.provider, "client");

    let response = harness
        .engine()
        .token(TokenRequest {
            grant_type: grants::CLIENT_CREDENTIALS.to_owned(),
            client_id: CLIENT_ID.to_owned(),
            client_secret: Some(CLIENT_SECRET.to_owned()),
            ..TokenRequest::default()
        })
        .await
        .unwrap();
    assert!(response.user.is_none());
    assert!(response.scope.is_none());

    let info = handler.get_access_token(&response.access_token).await.unwrap();
    assert_eq!(info.user.id, CLIENT_ID);
    assert!(info.scope.is_empty());
}

// ============================================================================
// Builder
// ============================================================================

#[tokio::test]
async fn test_builder_reports_missing_collaborator() {
    common::init_test_logging();
    let error = Handlers::builder()
        .with_scope_source(ScopeSource::Catalogue(sample_catalogue()))
        .with_clients(Arc::new(InMemoryRepository::<Client>::new()))
        .with_tokens(Arc::new(InMemoryRepository::<Token>::new()))
        .build()
        .await
        .err()
        .unwrap();

    assert_eq!(error.code, ErrorCode::ConfigInvalid);
    assert!(error.message.contains("User repository"));
}

#[tokio::test]
async fn test_builder_rejects_invalid_catalogue() {
    let harness = TestHarness::new().await;
    let mut catalogue = sample_catalogue();
    catalogue.scopes[2].relations[0].group_by = None;

    let error = Handlers::builder()
        .with_scope_source(ScopeSource::Catalogue(catalogue))
        .with_clients(harness.clients.clone())
        .with_tokens(harness.tokens.clone())
        .with_users(harness.users.clone())
        .with_signer(harness.signer.clone())
        .with_auth_service(Arc::new(common::sample_auth_service()))
        .build()
        .await
        .err()
        .unwrap();
    assert_eq!(error.code, ErrorCode::ConfigInvalid);
}

#[tokio::test]
async fn test_builder_shares_injected_scope_manager() {
    let harness = TestHarness::new().await;
    let manager = Arc::clone(harness.handlers.scope_manager());

    let handlers = Handlers::builder()
        .with_scope_manager(Arc::clone(&manager))
        .with_clients(harness.clients.clone())
        .with_tokens(harness.tokens.clone())
        .with_users(harness.users.clone())
        .with_signer(harness.signer.clone())
        .with_auth_service(Arc::new(common::sample_auth_service()))
        .with_auth_code_lifetime(Duration::seconds(30))
        .build()
        .await
        .unwrap();

    assert!(Arc::ptr_eq(handlers.scope_manager(), &manager));
    assert!(Arc::ptr_eq(handlers.core.fetcher().scope_manager(), &manager));
    assert_eq!(handlers.core.auth_code_lifetime(), Duration::seconds(30));
}
