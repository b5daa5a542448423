// ABOUTME: Scope-gated user data loading for token payloads
// ABOUTME: Plans a minimal query, runs one find_one and flattens the result, degrading on failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::flatten::{flatten_base, flatten_relation, RelationIndex};
use super::query::QueryStructure;
use crate::constants::scopes::ID_FIELD;
use crate::repository::{Repository, UserRecord};
use crate::scopes::ScopeManager;

/// Which user to load and with which scopes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// User ID
    pub user_id: String,
    /// Granted scopes; empty means the default scope set
    pub granted_scopes: Vec<String>,
}

impl FetchRequest {
    /// Build a request
    #[must_use]
    pub fn new(user_id: impl Into<String>, granted_scopes: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            granted_scopes,
        }
    }
}

/// Flattened user data; always contains `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UserPayload(Map<String, Value>);

impl UserPayload {
    /// Payload carrying only the user ID
    #[must_use]
    pub fn minimal(user_id: &str) -> Self {
        let mut map = Map::new();
        map.insert(ID_FIELD.to_owned(), Value::String(user_id.to_owned()));
        Self(map)
    }

    /// Value of a flattened key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value of a flattened key as a string
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The user ID, rendered as a string
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.0.get(ID_FIELD)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Flattened keys
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Underlying map
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying map
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Why a fetch fell back to the minimal payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// No user with that ID
    NotFound,
    /// The repository failed
    RepositoryError(String),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("user not found"),
            Self::RepositoryError(e) => write!(f, "repository error: {e}"),
        }
    }
}

/// Result of a scope-gated fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFetch {
    /// Every granted field was loaded
    Full(UserPayload),
    /// Only `{ id }` is available
    Degraded {
        /// Minimal payload
        payload: UserPayload,
        /// Cause
        reason: DegradedReason,
    },
}

impl UserFetch {
    /// Payload regardless of outcome
    #[must_use]
    pub const fn payload(&self) -> &UserPayload {
        match self {
            Self::Full(payload) | Self::Degraded { payload, .. } => payload,
        }
    }

    /// Consume into the payload
    #[must_use]
    pub fn into_payload(self) -> UserPayload {
        match self {
            Self::Full(payload) | Self::Degraded { payload, .. } => payload,
        }
    }

    /// Whether the fetch degraded
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Loads the user fields granted by a set of scopes
pub struct UserDataFetcher {
    scopes: Arc<ScopeManager>,
    relations: RelationIndex,
    users: Arc<dyn Repository<UserRecord>>,
}

impl UserDataFetcher {
    /// Create a fetcher; relation metadata is derived once here
    #[must_use]
    pub fn new(scopes: Arc<ScopeManager>, users: Arc<dyn Repository<UserRecord>>) -> Self {
        let relations = RelationIndex::from_manager(&scopes);
        Self {
            scopes,
            relations,
            users,
        }
    }

    /// Scope manager this fetcher resolves against
    #[must_use]
    pub fn scope_manager(&self) -> &Arc<ScopeManager> {
        &self.scopes
    }

    /// Query that `fetch_by_scopes` would run for these scopes
    #[must_use]
    pub fn plan(&self, granted_scopes: &[String]) -> QueryStructure {
        if granted_scopes.is_empty() {
            QueryStructure::plan(&self.scopes, &self.relations, self.scopes.default_scopes())
        } else {
            QueryStructure::plan(&self.scopes, &self.relations, granted_scopes)
        }
    }

    /// Load and flatten the user fields the granted scopes allow
    ///
    /// Never fails: a missing user or repository error yields
    /// [`UserFetch::Degraded`] with `{ id }`.
    pub async fn fetch_by_scopes(&self, request: FetchRequest) -> UserFetch {
        let query = self.plan(&request.granted_scopes);
        let filter = query.to_filter(&request.user_id);

        debug!(
            user_id = %request.user_id,
            base_fields = query.base_fields.len(),
            relations = query.relations.len(),
            "Fetching user data by scopes"
        );

        let record = match self.users.find_one(&filter).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(user_id = %request.user_id, "User not found, returning minimal payload");
                return UserFetch::Degraded {
                    payload: UserPayload::minimal(&request.user_id),
                    reason: DegradedReason::NotFound,
                };
            }
            Err(e) => {
                warn!(
                    user_id = %request.user_id,
                    error = %e,
                    "User data fetch failed, returning minimal payload"
                );
                return UserFetch::Degraded {
                    payload: UserPayload::minimal(&request.user_id),
                    reason: DegradedReason::RepositoryError(e.to_string()),
                };
            }
        };

        UserFetch::Full(self.flatten(&record, &query, &request.user_id))
    }

    fn flatten(&self, record: &UserRecord, query: &QueryStructure, user_id: &str) -> UserPayload {
        let mut payload = flatten_base(record, &query.base_fields);

        for relation in &query.relations {
            let (Some(related), Some(meta)) = (
                record.get(&relation.relation),
                self.relations.get(&relation.relation),
            ) else {
                continue;
            };
            payload.extend(flatten_relation(
                &relation.relation,
                related,
                &relation.fields,
                meta,
            ));
        }

        payload
            .entry(ID_FIELD)
            .or_insert_with(|| Value::String(user_id.to_owned()));

        UserPayload(payload)
    }
}
