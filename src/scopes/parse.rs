// ABOUTME: Scope string grammar: resource:action:path parsing and normalization
// ABOUTME: Accepts space-delimited strings or lists and produces deduplicated scope lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::scopes::{MIN_SEGMENTS, SEGMENT_SEPARATOR};

/// A scope string split into its hierarchical parts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedScope {
    /// The scope as requested
    pub original: String,
    /// Resource segment (`user`)
    pub resource: String,
    /// Action segment (`read`)
    pub action: String,
    /// Remaining segments (`profile`, `firstName`)
    pub path: Vec<String>,
}

impl ParsedScope {
    /// Parse `resource:action:path[:subpath...]`
    ///
    /// Returns `None` for fewer than three segments or any empty segment.
    #[must_use]
    pub fn parse(scope: &str) -> Option<Self> {
        let segments: Vec<&str> = scope.trim().split(SEGMENT_SEPARATOR).collect();
        if segments.len() < MIN_SEGMENTS || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        Some(Self {
            original: scope.trim().to_owned(),
            resource: segments[0].to_owned(),
            action: segments[1].to_owned(),
            path: segments[2..].iter().map(|s| (*s).to_owned()).collect(),
        })
    }

    /// Whether this scope targets `resource:action`
    #[must_use]
    pub fn targets(&self, resource: &str, action: &str) -> bool {
        self.resource == resource && self.action == action
    }
}

impl fmt::Display for ParsedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Parse a batch of scopes, discarding malformed entries
#[must_use]
pub fn parse_scopes<S: AsRef<str>>(scopes: &[S]) -> Vec<ParsedScope> {
    scopes
        .iter()
        .filter_map(|scope| {
            let scope = scope.as_ref();
            let parsed = ParsedScope::parse(scope);
            if parsed.is_none() {
                debug!(scope, "Discarding malformed scope");
            }
            parsed
        })
        .collect()
}

/// Scopes as they arrive from the protocol engine or a repository row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawScopes {
    /// Nothing supplied
    #[default]
    Absent,
    /// OAuth2 `scope` parameter style: space-delimited
    Delimited(String),
    /// Already a list
    List(Vec<String>),
}

impl From<&str> for RawScopes {
    fn from(value: &str) -> Self {
        Self::Delimited(value.to_owned())
    }
}

impl From<String> for RawScopes {
    fn from(value: String) -> Self {
        Self::Delimited(value)
    }
}

impl From<Vec<String>> for RawScopes {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<&[String]> for RawScopes {
    fn from(value: &[String]) -> Self {
        Self::List(value.to_vec())
    }
}

impl From<&Vec<String>> for RawScopes {
    fn from(value: &Vec<String>) -> Self {
        Self::List(value.clone())
    }
}

impl From<Vec<&str>> for RawScopes {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_owned).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for RawScopes {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Normalize raw scopes into a deduplicated list, keeping first-seen order
///
/// List entries are split on whitespace as well, so normalizing an already
/// normalized list returns it unchanged.
#[must_use]
pub fn normalize_scopes(raw: impl Into<RawScopes>) -> Vec<String> {
    let entries: Vec<String> = match raw.into() {
        RawScopes::Absent => return Vec::new(),
        RawScopes::Delimited(value) => vec![value],
        RawScopes::List(values) => values,
    };

    let mut seen = HashSet::new();
    entries
        .iter()
        .flat_map(|entry| entry.split_whitespace())
        .filter(|scope| seen.insert(*scope))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_nested_path() {
        let parsed = ParsedScope::parse("user:read:profile:firstName").unwrap();
        assert_eq!(parsed.resource, "user");
        assert_eq!(parsed.action, "read");
        assert_eq!(parsed.path, vec!["profile", "firstName"]);
    }

    #[test]
    fn test_parse_rejects_short_and_empty_segments() {
        assert!(ParsedScope::parse("user:read").is_none());
        assert!(ParsedScope::parse("user::basic").is_none());
        assert!(ParsedScope::parse("").is_none());
    }
}
