// ABOUTME: Client credentials grant handler
// ABOUTME: Resolves the pseudo-user a confidential client acts as
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use warden_core::models::OAuthUser;

use super::core::{HandlerCore, OAuth2Model};
use crate::auth::UserAuthService;
use crate::errors::AppResult;
use crate::oauth2_server::models::EngineClient;

/// Client credentials operations the protocol engine needs
#[async_trait]
pub trait ClientCredentialsModel: OAuth2Model {
    /// Identity a client acts as
    ///
    /// # Errors
    ///
    /// Returns an error if the client is unknown or may not act on its own behalf
    async fn get_user_from_client(&self, client: &EngineClient) -> AppResult<OAuthUser>;
}

/// Handler backing the `client_credentials` grant
pub struct ClientCredentialsHandler {
    core: Arc<HandlerCore>,
    auth: Arc<dyn UserAuthService>,
}

impl ClientCredentialsHandler {
    /// Create a handler over shared state
    #[must_use]
    pub fn new(core: Arc<HandlerCore>, auth: Arc<dyn UserAuthService>) -> Self {
        Self { core, auth }
    }
}

impl OAuth2Model for ClientCredentialsHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }
}

#[async_trait]
impl ClientCredentialsModel for ClientCredentialsHandler {
    async fn get_user_from_client(&self, client: &EngineClient) -> AppResult<OAuthUser> {
        let client = self.core.find_client(&client.client_id).await?;
        let user = self.auth.identity_for_client(&client).await?;
        debug!(client_id = %client.client_id, user_id = %user.id, "Resolved client identity");
        Ok(user)
    }
}
