// ABOUTME: In-memory JSON document repository used by tests, benches and the operator CLI
// ABOUTME: Evaluates where equality, field projection and include projection over stored rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{Filter, Repository};
use crate::errors::{AppError, AppResult};

/// Repository keeping every row as a JSON object
///
/// Relations are stored nested inside the owning row: an object for `hasOne`,
/// an array of objects for `hasMany`.
pub struct InMemoryRepository<E> {
    rows: RwLock<Vec<Map<String, Value>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            _entity: PhantomData,
        }
    }
}

impl<E> InMemoryRepository<E>
where
    E: Serialize + DeserializeOwned,
{
    /// Empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository seeded with entities
    ///
    /// # Errors
    ///
    /// Returns an error if an entity does not serialize to a JSON object
    pub fn with_rows(rows: impl IntoIterator<Item = E>) -> AppResult<Self> {
        let rows = rows
            .into_iter()
            .map(|row| to_document(&row))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self {
            rows: RwLock::new(rows),
            _entity: PhantomData,
        })
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Every stored row, unprojected
    ///
    /// # Errors
    ///
    /// Returns an error if a stored row no longer deserializes into `E`
    pub async fn all(&self) -> AppResult<Vec<E>> {
        self.rows
            .read()
            .await
            .iter()
            .map(|row| serde_json::from_value(Value::Object(row.clone())).map_err(AppError::from))
            .collect()
    }
}

#[async_trait]
impl<E> Repository<E> for InMemoryRepository<E>
where
    E: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn find_one(&self, filter: &Filter) -> AppResult<Option<E>> {
        let rows = self.rows.read().await;
        let Some(row) = rows.iter().find(|row| matches(row, filter)) else {
            return Ok(None);
        };

        let projected = project(row, filter);
        Ok(Some(serde_json::from_value(Value::Object(projected))?))
    }

    async fn create(&self, entity: E) -> AppResult<E> {
        let document = to_document(&entity)?;
        self.rows.write().await.push(document);
        Ok(entity)
    }
}

fn to_document<E: Serialize>(entity: &E) -> AppResult<Map<String, Value>> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::invalid_input(format!(
            "Repository rows must be JSON objects, got {other}"
        ))),
    }
}

fn matches(row: &Map<String, Value>, filter: &Filter) -> bool {
    filter
        .where_clause
        .iter()
        .all(|(key, expected)| row.get(key) == Some(expected))
}

fn project(row: &Map<String, Value>, filter: &Filter) -> Map<String, Value> {
    let mut projected = if filter.fields.is_empty() {
        row.clone()
    } else {
        filter
            .fields
            .iter()
            .filter_map(|field| row.get(field).map(|v| (field.clone(), v.clone())))
            .collect()
    };

    for include in &filter.include {
        if let Some(related) = row.get(&include.relation) {
            projected.insert(
                include.relation.clone(),
                project_relation(related, &include.scope.fields),
            );
        }
    }

    projected
}

fn project_relation(related: &Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return related.clone();
    }
    match related {
        Value::Object(map) => Value::Object(pick(map, fields)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => Value::Object(pick(map, fields)),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

fn pick(map: &Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|field| map.get(field).map(|v| (field.clone(), v.clone())))
        .collect()
}
