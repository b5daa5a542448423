// ABOUTME: Application services orchestrating handlers and external collaborators
// ABOUTME: Hosts the OAuth2 browser flow and client webhook service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// OAuth2 orchestration
pub mod oauth2;

pub use oauth2::{
    CallbackDelivery, CallbackReport, ClientToken, OAuth2Outcome, OAuth2Service,
    OAuth2ServiceSettings,
};
