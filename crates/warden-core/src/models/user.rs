// ABOUTME: User identity handed to the protocol engine alongside clients and tokens
// ABOUTME: Built either by the application auth service or from a scope-gated profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated user as seen by the OAuth2 handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthUser {
    /// User ID
    pub id: String,
    /// Subject the token is issued for; defaults to the user ID
    pub subject_id: String,
    /// Role names
    #[serde(default)]
    pub roles: Vec<String>,
    /// Identity provider that authenticated the user
    #[serde(default)]
    pub provider: String,
    /// Scope-gated profile claims, when resolved through the user data fetcher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Map<String, Value>>,
}

impl OAuthUser {
    /// Identity with no roles or profile
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            subject_id: id.clone(),
            id,
            roles: Vec::new(),
            provider: provider.into(),
            profile: None,
        }
    }

    /// Set the roles
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// Set the token subject
    #[must_use]
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = subject_id.into();
        self
    }

    /// Attach a flattened profile
    #[must_use]
    pub fn with_profile(mut self, profile: Map<String, Value>) -> Self {
        self.profile = Some(profile);
        self
    }
}
