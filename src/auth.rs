// ABOUTME: Application authentication seam used by the password and client credentials grants
// ABOUTME: UserAuthService trait plus an in-memory credential store holding bcrypt hashes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! The application owns user credentials. Handlers only need a user identity
//! for a username/password pair or for a confidential client.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tracing::debug;
use warden_core::models::{Client, OAuthUser};
use zeroize::Zeroizing;

use crate::errors::{AppError, AppResult};

/// Provider name for identities derived from a client
pub const CLIENT_PROVIDER: &str = "client";

/// Resolves OAuth users from credentials
#[async_trait]
pub trait UserAuthService: Send + Sync {
    /// Authenticate a resource owner
    ///
    /// # Errors
    ///
    /// Returns an `AuthInvalid` error if the credentials are rejected
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client: Option<&Client>,
    ) -> AppResult<OAuthUser>;

    /// Pseudo-user representing a client in the client credentials grant
    ///
    /// # Errors
    ///
    /// Returns an error if the client may not act on its own behalf
    async fn identity_for_client(&self, client: &Client) -> AppResult<OAuthUser>;
}

/// Sign-in form submitted on the browser leg
#[derive(Clone)]
pub struct SignInCredentials {
    /// Username
    pub username: String,
    /// Password
    pub password: Zeroizing<String>,
    /// Encrypted client token minted by the request path
    pub client_token: String,
}

impl SignInCredentials {
    /// Build sign-in credentials
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        client_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
            client_token: client_token.into(),
        }
    }
}

impl fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("client_token", &"[REDACTED]")
            .finish()
    }
}

struct StoredCredential {
    password_hash: String,
    user: OAuthUser,
}

/// Credential store kept in memory; passwords are held as bcrypt hashes
#[derive(Default)]
pub struct InMemoryUserAuthService {
    users: HashMap<String, StoredCredential>,
}

impl InMemoryUserAuthService {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user
    ///
    /// # Errors
    ///
    /// Returns an error if the password cannot be hashed
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: &str,
        user: OAuthUser,
    ) -> AppResult<Self> {
        // Low cost keeps debug builds and test suites fast
        let cost = if cfg!(debug_assertions) {
            4
        } else {
            bcrypt::DEFAULT_COST
        };
        let password_hash = bcrypt::hash(password, cost)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
        self.users.insert(
            username.into(),
            StoredCredential {
                password_hash,
                user,
            },
        );
        Ok(self)
    }
}

/// Verify password against hash using bcrypt with `spawn_blocking`
async fn verify_password(password: &str, hash: &str) -> bool {
    let password = Zeroizing::new(password.to_owned());
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password.as_str(), &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

#[async_trait]
impl UserAuthService for InMemoryUserAuthService {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client: Option<&Client>,
    ) -> AppResult<OAuthUser> {
        let stored = self
            .users
            .get(username)
            .ok_or_else(|| AppError::auth_invalid("Invalid username or password"))?;

        if !verify_password(password, &stored.password_hash).await {
            return Err(AppError::auth_invalid("Invalid username or password"));
        }

        debug!(
            username,
            client_id = client.map_or("-", |c| c.client_id.as_str()),
            "User authenticated"
        );
        Ok(stored.user.clone())
    }

    async fn identity_for_client(&self, client: &Client) -> AppResult<OAuthUser> {
        Ok(OAuthUser::new(client.client_id.clone(), CLIENT_PROVIDER)
            .with_roles(vec![CLIENT_PROVIDER.to_owned()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let service = InMemoryUserAuthService::new()
            .with_user("ada", "correct horse", OAuthUser::new("u-1", "local"))
            .unwrap();

        assert_eq!(
            service.authenticate("ada", "correct horse", None).await.unwrap().id,
            "u-1"
        );
        assert!(service.authenticate("ada", "wrong", None).await.is_err());
        assert!(service.authenticate("bob", "correct horse", None).await.is_err());
    }

    #[test]
    fn test_passwords_are_stored_as_salted_bcrypt_hashes() {
        let service = InMemoryUserAuthService::new()
            .with_user("ada", "correct horse", OAuthUser::new("u-1", "local"))
            .unwrap()
            .with_user("bob", "correct horse", OAuthUser::new("u-2", "local"))
            .unwrap();

        let ada = &service.users["ada"].password_hash;
        let bob = &service.users["bob"].password_hash;
        assert!(ada.starts_with("$2"));
        assert!(!ada.contains("correct horse"));
        assert_ne!(ada, bob);
        assert!(bcrypt::verify("correct horse", ada).unwrap());
    }
}
