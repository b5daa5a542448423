// ABOUTME: Translates granted scopes into the minimal user read query
// ABOUTME: Collects base fields and relation includes, forcing id and linkage fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::Serialize;
use tracing::warn;

use super::flatten::{RelationIndex, RelationMeta};
use crate::constants::scopes::ID_FIELD;
use crate::repository::Filter;
use crate::scopes::{ParsedScope, ScopeManager, ScopeResolution};

/// Fields to load from one relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationQuery {
    /// Relation name
    pub relation: String,
    /// Related fields, linkage included
    pub fields: Vec<String>,
}

/// Minimal read plan derived from granted scopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStructure {
    /// Base fields of the user entity; always contains `id`
    pub base_fields: Vec<String>,
    /// Relation includes in first-requested order
    pub relations: Vec<RelationQuery>,
}

impl Default for QueryStructure {
    fn default() -> Self {
        Self {
            base_fields: vec![ID_FIELD.to_owned()],
            relations: Vec::new(),
        }
    }
}

impl QueryStructure {
    /// Plan the query for a list of granted scope strings
    ///
    /// Scopes that do not resolve are skipped with a warning.
    #[must_use]
    pub fn plan<S: AsRef<str>>(
        manager: &ScopeManager,
        relations: &RelationIndex,
        scopes: &[S],
    ) -> Self {
        let mut query = Self::default();
        for scope in manager.parse_scopes(scopes) {
            query.apply(manager, relations, &scope);
        }
        query
    }

    fn apply(&mut self, manager: &ScopeManager, relations: &RelationIndex, scope: &ParsedScope) {
        match manager.resolve(scope) {
            ScopeResolution::RelationFields {
                relation,
                fields,
            } => self.add_relation(relations, &relation, &fields),
            ScopeResolution::Group(group) => {
                self.add_base_fields(&group.fields);
                for definition in &group.relations {
                    self.add_relation(relations, &definition.relation, &definition.fields);
                }
            }
            ScopeResolution::BaseFields(fields) => self.add_base_fields(&fields),
            ScopeResolution::Unresolved(reason) => {
                warn!(scope = %scope, reason = %reason, "Skipping scope that grants no user data");
            }
        }
    }

    fn add_base_fields(&mut self, fields: &[String]) {
        for field in fields {
            push_unique(&mut self.base_fields, field);
        }
    }

    fn add_relation(&mut self, relations: &RelationIndex, relation: &str, fields: &[String]) {
        let Some(meta) = relations.get(relation) else {
            warn!(relation, "Skipping relation without usable metadata");
            return;
        };

        let index = match self.relations.iter().position(|r| r.relation == relation) {
            Some(index) => index,
            None => {
                self.relations.push(RelationQuery {
                    relation: relation.to_owned(),
                    fields: linkage(meta),
                });
                self.relations.len() - 1
            }
        };

        let entry = &mut self.relations[index];
        for field in fields {
            push_unique(&mut entry.fields, field);
        }
    }

    /// Relation query by name
    #[must_use]
    pub fn relation(&self, relation: &str) -> Option<&RelationQuery> {
        self.relations.iter().find(|r| r.relation == relation)
    }

    /// Repository filter loading the planned fields of one user
    #[must_use]
    pub fn to_filter(&self, user_id: &str) -> Filter {
        self.relations.iter().fold(
            Filter::new()
                .where_eq(ID_FIELD, user_id)
                .with_fields(self.base_fields.iter().cloned()),
            |filter, relation| filter.include(&relation.relation, relation.fields.iter().cloned()),
        )
    }
}

fn linkage(meta: &RelationMeta) -> Vec<String> {
    let mut fields = Vec::new();
    for field in meta.linkage_fields() {
        push_unique(&mut fields, field);
    }
    fields
}

fn push_unique(fields: &mut Vec<String>, field: &str) {
    if !fields.iter().any(|f| f == field) {
        fields.push(field.to_owned());
    }
}
