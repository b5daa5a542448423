// ABOUTME: Scope catalogue configuration documents: scope groups and relation scopes
// ABOUTME: Deserialized from JSON or YAML at startup and immutable afterwards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Foreign key linking relation rows back to the user when none is configured
pub const DEFAULT_FOREIGN_KEY: &str = "user_id";

/// Cardinality of a user relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    /// Single related row (e.g. profile)
    HasOne,
    /// Many related rows grouped by a discriminator field (e.g. identifiers)
    HasMany,
}

/// Fields of a related entity a scope grants access to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationScopeDefinition {
    /// Relation name on the user entity
    pub relation: String,
    /// Relation cardinality
    #[serde(rename = "type")]
    pub kind: RelationKind,
    /// Accessible fields of the related entity
    #[serde(default)]
    pub fields: Vec<String>,
    /// Discriminator field used to group `hasMany` rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Column linking related rows to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
}

impl RelationScopeDefinition {
    /// Configured foreign key or [`DEFAULT_FOREIGN_KEY`]
    #[must_use]
    pub fn foreign_key(&self) -> &str {
        self.foreign_key.as_deref().unwrap_or(DEFAULT_FOREIGN_KEY)
    }
}

/// Named bundle of base fields and relation fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeDefinition {
    /// Unique identifier, addressed as `user:read:<identifier>`
    pub identifier: String,
    /// Display name
    pub name: String,
    /// Optional description shown on consent screens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accessible base fields of the user entity
    #[serde(default)]
    pub fields: Vec<String>,
    /// Accessible relations
    #[serde(default)]
    pub relations: Vec<RelationScopeDefinition>,
}

/// Complete scope configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeCatalogue {
    /// Available scope definitions
    pub scopes: Vec<ScopeDefinition>,
    /// Scope strings used when a token carries no scopes
    #[serde(default)]
    pub default_scopes: Vec<String>,
    /// Requested field name -> underlying field names
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl ScopeCatalogue {
    /// Find a scope definition by identifier
    #[must_use]
    pub fn scope(&self, identifier: &str) -> Option<&ScopeDefinition> {
        self.scopes.iter().find(|s| s.identifier == identifier)
    }
}
