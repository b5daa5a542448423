// ABOUTME: Persistence abstraction consumed by handlers and the user data fetcher
// ABOUTME: Generic find/create repository trait with a where/fields/include query filter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Storage is an external collaborator. Implementations translate [`Filter`]
//! into their own query language; [`memory::InMemoryRepository`] evaluates it
//! over JSON documents.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::AppResult;

/// Query filter
pub mod filter;
/// JSON document store
pub mod memory;

pub use filter::{Filter, Include, IncludeScope};
pub use memory::InMemoryRepository;

/// User rows are schemaless: base fields plus included relations
pub type UserRecord = Map<String, Value>;

/// Minimal repository contract
#[async_trait]
pub trait Repository<E>: Send + Sync {
    /// First entity matching the filter, projected to the requested fields
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails
    async fn find_one(&self, filter: &Filter) -> AppResult<Option<E>>;

    /// Persist a new entity and return it as stored
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the entity
    async fn create(&self, entity: E) -> AppResult<E>;
}
