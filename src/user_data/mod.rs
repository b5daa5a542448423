// ABOUTME: Scope-gated user data fetching: query planning, execution and flattening
// ABOUTME: Produces the flat user object embedded into token responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Fetch orchestration
pub mod fetcher;
/// Pure flattening functions
pub mod flatten;
/// Query planning
pub mod query;

pub use fetcher::{DegradedReason, FetchRequest, UserDataFetcher, UserFetch, UserPayload};
pub use flatten::{RelationIndex, RelationMeta, RelationShape};
pub use query::{QueryStructure, RelationQuery};
