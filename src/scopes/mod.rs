// ABOUTME: Hierarchical access scope handling: grammar, catalogue loading and resolution
// ABOUTME: Exposes the ScopeManager and the startup ScopeConfigValidator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Catalogue document loading
pub mod catalogue;
/// Catalogue index and scope resolution
pub mod manager;
/// Scope string grammar
pub mod parse;
/// Startup catalogue validation
pub mod validator;

pub use catalogue::{load_catalogue, parse_catalogue, CatalogueFormat};
pub use manager::{ScopeManager, ScopeResolution, ScopeValidation, UnresolvedReason};
pub use parse::{normalize_scopes, parse_scopes, ParsedScope, RawScopes};
pub use validator::{IssueSeverity, ScopeConfigIssue, ScopeConfigValidator, ValidationReport};
