// ABOUTME: Pure flattening of nested user rows into token-payload-shaped objects
// ABOUTME: hasOne fields become relation_field, hasMany rows become groupValue_field
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;
use warden_core::models::{RelationKind, RelationScopeDefinition};

use crate::constants::scopes::ID_FIELD;
use crate::scopes::ScopeManager;

/// How a relation's rows are flattened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationShape {
    /// Single row, keys prefixed with the relation name
    HasOne,
    /// Many rows, keys prefixed with each row's discriminator value
    HasMany {
        /// Discriminator field
        group_by: String,
    },
}

/// Flattening metadata of one relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMeta {
    /// Cardinality and grouping
    pub shape: RelationShape,
    /// Column linking related rows to the user
    pub foreign_key: String,
}

impl RelationMeta {
    /// Derive metadata from a definition; `None` for `hasMany` without `groupBy`
    #[must_use]
    pub fn from_definition(definition: &RelationScopeDefinition) -> Option<Self> {
        let shape = match definition.kind {
            RelationKind::HasOne => RelationShape::HasOne,
            RelationKind::HasMany => RelationShape::HasMany {
                group_by: definition.group_by.clone().filter(|g| !g.is_empty())?,
            },
        };
        Some(Self {
            shape,
            foreign_key: definition.foreign_key().to_owned(),
        })
    }

    /// Fields the query must load to link and group related rows
    #[must_use]
    pub fn linkage_fields(&self) -> Vec<&str> {
        let mut fields = vec![ID_FIELD, self.foreign_key.as_str()];
        if let RelationShape::HasMany { group_by } = &self.shape {
            fields.push(group_by.as_str());
        }
        fields
    }

    /// Whether a field only exists for linkage
    #[must_use]
    pub fn is_linkage(&self, field: &str) -> bool {
        self.linkage_fields().contains(&field)
    }
}

/// Relation metadata indexed by relation name; the first definition wins
#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    relations: HashMap<String, RelationMeta>,
}

impl RelationIndex {
    /// Scan every scope's relations once
    #[must_use]
    pub fn from_manager(manager: &ScopeManager) -> Self {
        let mut relations = HashMap::new();
        for definition in manager.relation_definitions() {
            if relations.contains_key(&definition.relation) {
                continue;
            }
            match RelationMeta::from_definition(definition) {
                Some(meta) => {
                    relations.insert(definition.relation.clone(), meta);
                }
                None => warn!(
                    relation = %definition.relation,
                    "Skipping hasMany relation without groupBy"
                ),
            }
        }
        Self { relations }
    }

    /// Metadata of a relation
    #[must_use]
    pub fn get(&self, relation: &str) -> Option<&RelationMeta> {
        self.relations.get(relation)
    }

    /// Number of indexed relations
    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether no relation is indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

const fn is_primitive(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Copy requested primitive base fields
#[must_use]
pub fn flatten_base(record: &Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|field| {
            record
                .get(field)
                .filter(|value| is_primitive(value))
                .map(|value| (field.clone(), value.clone()))
        })
        .collect()
}

/// Flatten a `hasOne` row into `relation_field` keys
#[must_use]
pub fn flatten_has_one(
    relation: &str,
    related: &Value,
    fields: &[String],
    meta: &RelationMeta,
) -> Map<String, Value> {
    let Value::Object(row) = related else {
        return Map::new();
    };

    fields
        .iter()
        .filter(|field| !meta.is_linkage(field))
        .filter_map(|field| {
            row.get(field)
                .map(|value| (format!("{relation}_{field}"), value.clone()))
        })
        .collect()
}

/// Flatten `hasMany` rows into `groupValue_field` keys
///
/// Rows without a usable group value are skipped. When two rows share a group
/// value the later row wins.
#[must_use]
pub fn flatten_has_many(
    related: &Value,
    group_by: &str,
    fields: &[String],
    meta: &RelationMeta,
) -> Map<String, Value> {
    let Value::Array(rows) = related else {
        return Map::new();
    };

    let mut flattened = Map::new();
    for row in rows.iter().filter_map(Value::as_object) {
        let Some(group) = row.get(group_by).and_then(group_value) else {
            continue;
        };
        for field in fields.iter().filter(|field| !meta.is_linkage(field)) {
            if let Some(value) = row.get(field) {
                flattened.insert(format!("{group}_{field}"), value.clone());
            }
        }
    }
    flattened
}

fn group_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flatten one relation according to its shape
#[must_use]
pub fn flatten_relation(
    relation: &str,
    related: &Value,
    fields: &[String],
    meta: &RelationMeta,
) -> Map<String, Value> {
    match &meta.shape {
        RelationShape::HasOne => flatten_has_one(relation, related, fields, meta),
        RelationShape::HasMany { group_by } => flatten_has_many(related, group_by, fields, meta),
    }
}
