// ABOUTME: OAuth 2.0 client entity as stored by the external client repository
// ABOUTME: Carries redirect URIs for sign-in and callback URLs for webhook fan-out
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Stored OAuth 2.0 Client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Internal row ID
    pub id: i64,
    /// Public OAuth 2.0 client identifier
    pub client_id: String,
    /// Client secret shared with the client application
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Allowed OAuth 2.0 grant types (`authorization_code`, `password`, ...)
    #[serde(default)]
    pub grants: Vec<String>,
    /// Registered redirect URIs for the authorization code flow
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Webhook URLs notified by client callbacks
    #[serde(default)]
    pub callback_urls: Vec<String>,
}

impl Client {
    /// Whether `redirect_url` exactly matches a registered redirect URI
    #[must_use]
    pub fn has_redirect_uri(&self, redirect_url: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_url)
    }
}
