// ABOUTME: Repository query filter with equality conditions, field projection and includes
// ABOUTME: Serializes to the { where, fields, include } shape storage adapters expect
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Projection applied to an included relation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeScope {
    /// Related fields to return; empty returns all
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Relation to load alongside the entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    /// Relation name
    pub relation: String,
    /// Projection of the related rows
    #[serde(default)]
    pub scope: IncludeScope,
}

/// Query filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Equality conditions
    #[serde(rename = "where", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub where_clause: BTreeMap<String, Value>,
    /// Fields to return; empty returns all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    /// Relations to load
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<Include>,
}

impl Filter {
    /// Empty filter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition
    #[must_use]
    pub fn where_eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_clause.insert(key.into(), value.into());
        self
    }

    /// Restrict returned fields
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Load a relation with the given projection
    #[must_use]
    pub fn include<I, S>(mut self, relation: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.push(Include {
            relation: relation.into(),
            scope: IncludeScope {
                fields: fields.into_iter().map(Into::into).collect(),
            },
        });
        self
    }
}
