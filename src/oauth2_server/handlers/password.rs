// ABOUTME: Resource owner password grant handler
// ABOUTME: Delegates credential checks to the application's UserAuthService
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use warden_core::models::OAuthUser;

use super::core::{HandlerCore, OAuth2Model};
use crate::auth::UserAuthService;
use crate::errors::AppResult;
use crate::oauth2_server::models::EngineClient;

/// Password grant operations the protocol engine needs
#[async_trait]
pub trait PasswordModel: OAuth2Model {
    /// Authenticate a resource owner on behalf of a client
    ///
    /// # Errors
    ///
    /// Returns an error if the client is unknown or the credentials are rejected
    async fn get_user(
        &self,
        username: &str,
        password: &str,
        client: &EngineClient,
    ) -> AppResult<OAuthUser>;
}

/// Handler backing the `password` grant
pub struct PasswordHandler {
    core: Arc<HandlerCore>,
    auth: Arc<dyn UserAuthService>,
}

impl PasswordHandler {
    /// Create a handler over shared state
    #[must_use]
    pub fn new(core: Arc<HandlerCore>, auth: Arc<dyn UserAuthService>) -> Self {
        Self { core, auth }
    }
}

impl OAuth2Model for PasswordHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}

#[async_trait]
impl PasswordModel for PasswordHandler {
    async fn get_user(
        &self,
        username: &str,
        password: &str,
        client: &EngineClient,
    ) -> AppResult<OAuthUser> {
        let client = self.core.find_client(&client.client_id).await?;
        self.auth
            .authenticate(username, password, Some(&client))
            .await
    }
}
