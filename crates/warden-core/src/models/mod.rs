// ABOUTME: Core data models for clients, tokens, users and the scope catalogue
// ABOUTME: Re-exports the entity structs shared by handlers, repositories and the CLI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Entities owned by the external data store (`Client`, `Token`) and the
//! configuration documents this service is built from (`ScopeCatalogue`).
//!
//! All persisted entities serialize with snake_case keys; repository filters use
//! the same keys.

mod client;
mod scope;
mod token;
mod user;

pub use client::Client;
pub use scope::{
    RelationKind, RelationScopeDefinition, ScopeCatalogue, ScopeDefinition, DEFAULT_FOREIGN_KEY,
};
pub use token::{Token, TokenStatus, TokenType};
pub use user::OAuthUser;
