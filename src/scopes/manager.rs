// ABOUTME: Immutable scope catalogue index shared across handlers and the user data fetcher
// ABOUTME: Resolves user:read scopes to relation fields, scope groups or base fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Scope Manager
//!
//! Scopes follow `resource:action:path[:subpath...]`. Only `user:read` is
//! interpreted, with a single resolution rule shared by scope validation and
//! user data fetching:
//!
//! 1. `user:read:<relation>:<field>` resolves to a relation field
//! 2. `user:read:<scope identifier>` resolves to the whole scope group
//! 3. `user:read:<field>` resolves against `BASE_FIELDS`, the union of every
//!    scope's base fields
//!
//! Anything else is unresolved and dropped.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};
use warden_core::models::{RelationScopeDefinition, ScopeCatalogue, ScopeDefinition};

use super::catalogue::load_catalogue;
use super::parse::{normalize_scopes, parse_scopes, ParsedScope, RawScopes};
use super::validator::ScopeConfigValidator;
use crate::constants::scopes::{BASE_FIELDS, READ_ACTION, USER_RESOURCE};
use crate::errors::AppResult;

/// Why a scope did not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Anything other than `user:read`
    UnsupportedTarget {
        /// Resource segment
        resource: String,
        /// Action segment
        action: String,
    },
    /// Head segment names no scope, relation or base field
    UnknownScope(String),
    /// Field is not granted by the addressed scope or relation
    FieldNotAllowed {
        /// Relation name or `BASE_FIELDS`
        owner: String,
        /// Requested field
        field: String,
    },
    /// Relation path nested deeper than one field
    PathTooDeep,
    /// No segment after `resource:action`
    EmptyPath,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedTarget { resource, action } => {
                write!(f, "unsupported target {resource}:{action}")
            }
            Self::UnknownScope(head) => write!(f, "unknown scope '{head}'"),
            Self::FieldNotAllowed { owner, field } => {
                write!(f, "field '{field}' is not granted by '{owner}'")
            }
            Self::PathTooDeep => f.write_str("relation path is nested too deeply"),
            Self::EmptyPath => f.write_str("scope has no path"),
        }
    }
}

/// Outcome of resolving one parsed scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeResolution<'a> {
    /// Fields of a single relation
    RelationFields {
        /// Relation name
        relation: String,
        /// Underlying fields after alias expansion
        fields: Vec<String>,
    },
    /// A whole scope group
    Group(&'a ScopeDefinition),
    /// Base fields of the user entity
    BaseFields(Vec<String>),
    /// Scope grants nothing
    Unresolved(UnresolvedReason),
}

impl ScopeResolution<'_> {
    /// Whether the scope grants anything
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved(_))
    }
}

/// Requested scopes partitioned into granted and invalid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeValidation {
    /// No scope was dropped
    pub valid: bool,
    /// Scopes that resolve
    pub granted_scopes: Vec<String>,
    /// Dropped scopes, absent when none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_scopes: Option<Vec<String>>,
}

/// Catalogue index built once at startup and shared via `Arc`
#[derive(Debug, Clone)]
pub struct ScopeManager {
    catalogue: ScopeCatalogue,
    scope_index: HashMap<String, usize>,
    relation_fields: HashMap<String, Vec<String>>,
    base_fields: Vec<String>,
}

impl ScopeManager {
    /// Build a manager from a catalogue after validating it
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error if the catalogue fails validation
    pub fn from_catalogue(catalogue: ScopeCatalogue) -> AppResult<Self> {
        ScopeConfigValidator::validate_or_throw(&catalogue)?;

        let mut scope_index = HashMap::new();
        let mut relation_fields: HashMap<String, Vec<String>> = HashMap::new();
        let mut base_fields: Vec<String> = Vec::new();

        for (index, scope) in catalogue.scopes.iter().enumerate() {
            scope_index.entry(scope.identifier.clone()).or_insert(index);

            for field in &scope.fields {
                if !base_fields.contains(field) {
                    base_fields.push(field.clone());
                }
            }

            for relation in &scope.relations {
                let fields = relation_fields.entry(relation.relation.clone()).or_default();
                for field in &relation.fields {
                    if !fields.contains(field) {
                        fields.push(field.clone());
                    }
                }
            }
        }

        info!(
            scopes = catalogue.scopes.len(),
            relations = relation_fields.len(),
            base_fields = base_fields.len(),
            "Scope manager initialized"
        );

        Ok(Self {
            catalogue,
            scope_index,
            relation_fields,
            base_fields,
        })
    }

    /// Load a catalogue file and build a manager from it
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or fails validation
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let catalogue = load_catalogue(path).await?;
        Self::from_catalogue(catalogue)
    }

    /// Parse scopes, discarding malformed ones
    #[must_use]
    pub fn parse_scopes<S: AsRef<str>>(&self, scopes: &[S]) -> Vec<ParsedScope> {
        parse_scopes(scopes)
    }

    /// Normalize raw scopes into a deduplicated list
    #[must_use]
    pub fn normalize_scopes(&self, raw: impl Into<RawScopes>) -> Vec<String> {
        normalize_scopes(raw)
    }

    /// Underlying fields a request for `field` on `owner` maps to
    ///
    /// `owner` is a relation name, a scope identifier or `BASE_FIELDS`. Aliases
    /// expand to every target the owner allows. Empty when nothing is allowed.
    #[must_use]
    pub fn is_field_allowed(&self, owner: &str, field: &str) -> Vec<String> {
        let Some(allowed) = self.allowed_fields(owner) else {
            return Vec::new();
        };

        if allowed.iter().any(|f| f == field) {
            return vec![field.to_owned()];
        }

        self.catalogue
            .aliases
            .get(field)
            .map(|targets| {
                targets
                    .iter()
                    .filter(|target| allowed.contains(target))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn allowed_fields(&self, owner: &str) -> Option<&[String]> {
        if owner == BASE_FIELDS {
            return Some(&self.base_fields);
        }
        if let Some(fields) = self.relation_fields.get(owner) {
            return Some(fields);
        }
        self.scope(owner).map(|scope| scope.fields.as_slice())
    }

    /// Resolve one parsed scope
    #[must_use]
    pub fn resolve(&self, scope: &ParsedScope) -> ScopeResolution<'_> {
        if !scope.targets(USER_RESOURCE, READ_ACTION) {
            return ScopeResolution::Unresolved(UnresolvedReason::UnsupportedTarget {
                resource: scope.resource.clone(),
                action: scope.action.clone(),
            });
        }

        let Some(head) = scope.path.first().map(String::as_str) else {
            return ScopeResolution::Unresolved(UnresolvedReason::EmptyPath);
        };

        if self.is_relation(head) && scope.path.len() > 1 {
            if scope.path.len() > 2 {
                return ScopeResolution::Unresolved(UnresolvedReason::PathTooDeep);
            }
            let field = scope.path[1].as_str();
            let fields = self.is_field_allowed(head, field);
            if fields.is_empty() {
                return ScopeResolution::Unresolved(UnresolvedReason::FieldNotAllowed {
                    owner: head.to_owned(),
                    field: field.to_owned(),
                });
            }
            return ScopeResolution::RelationFields {
                relation: head.to_owned(),
                fields,
            };
        }

        if let Some(group) = self.scope(head) {
            return ScopeResolution::Group(group);
        }

        if scope.path.len() == 1 {
            let fields = self.is_field_allowed(BASE_FIELDS, head);
            if fields.is_empty() {
                return ScopeResolution::Unresolved(UnresolvedReason::FieldNotAllowed {
                    owner: BASE_FIELDS.to_owned(),
                    field: head.to_owned(),
                });
            }
            return ScopeResolution::BaseFields(fields);
        }

        ScopeResolution::Unresolved(UnresolvedReason::UnknownScope(head.to_owned()))
    }

    /// Partition requested scopes into granted and invalid
    ///
    /// Invalid scopes are dropped, never fatal.
    #[must_use]
    pub fn validate_scopes(&self, requested: impl Into<RawScopes>) -> ScopeValidation {
        let mut granted_scopes = Vec::new();
        let mut invalid_scopes = Vec::new();

        for scope in normalize_scopes(requested) {
            let resolved = ParsedScope::parse(&scope).map(|parsed| self.resolve(&parsed));
            match resolved {
                Some(resolution) if resolution.is_resolved() => granted_scopes.push(scope),
                Some(ScopeResolution::Unresolved(reason)) => {
                    debug!(scope = %scope, reason = %reason, "Dropping unresolved scope");
                    invalid_scopes.push(scope);
                }
                _ => {
                    debug!(scope = %scope, "Dropping malformed scope");
                    invalid_scopes.push(scope);
                }
            }
        }

        ScopeValidation {
            valid: invalid_scopes.is_empty(),
            granted_scopes,
            invalid_scopes: (!invalid_scopes.is_empty()).then_some(invalid_scopes),
        }
    }

    /// Every scope definition in the catalogue
    #[must_use]
    pub fn available_scopes(&self) -> &[ScopeDefinition] {
        &self.catalogue.scopes
    }

    /// Scopes substituted when a token carries none
    #[must_use]
    pub fn default_scopes(&self) -> &[String] {
        &self.catalogue.default_scopes
    }

    /// Scope definition by identifier
    #[must_use]
    pub fn scope(&self, identifier: &str) -> Option<&ScopeDefinition> {
        self.scope_index
            .get(identifier)
            .and_then(|index| self.catalogue.scopes.get(*index))
    }

    /// Whether any scope declares a relation with this name
    #[must_use]
    pub fn is_relation(&self, name: &str) -> bool {
        self.relation_fields.contains_key(name)
    }

    /// Union of every scope's base fields, in catalogue order
    #[must_use]
    pub fn base_fields(&self) -> &[String] {
        &self.base_fields
    }

    /// Every relation definition, in catalogue order
    pub fn relation_definitions(&self) -> impl Iterator<Item = &RelationScopeDefinition> {
        self.catalogue
            .scopes
            .iter()
            .flat_map(|scope| scope.relations.iter())
    }

    /// Underlying catalogue
    #[must_use]
    pub const fn catalogue(&self) -> &ScopeCatalogue {
        &self.catalogue
    }
}
