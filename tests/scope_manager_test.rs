// ABOUTME: Integration tests for scope parsing, normalization, resolution and validation
// ABOUTME: Exercises the ScopeManager against the shared sample catalogue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::sample_catalogue;
use serde_json::json;
use warden_oauth2::constants::scopes::BASE_FIELDS;
use warden_oauth2::errors::ErrorCode;
use warden_oauth2::scopes::{
    normalize_scopes, ParsedScope, RawScopes, ScopeManager, ScopeResolution, UnresolvedReason,
};

fn manager() -> ScopeManager {
    common::init_test_logging();
    ScopeManager::from_catalogue(sample_catalogue()).unwrap()
}

fn resolve<'a>(manager: &'a ScopeManager, scope: &str) -> ScopeResolution<'a> {
    manager.resolve(&ParsedScope::parse(scope).unwrap())
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn test_normalize_deduplicates_in_first_seen_order() {
    let normalized = normalize_scopes("user:read:basic  user:read:email user:read:basic");
    assert_eq!(normalized, vec!["user:read:basic", "user:read:email"]);
}

#[test]
fn test_normalize_is_idempotent() {
    let once = normalize_scopes(vec!["b a", "a", "c"]);
    let twice = normalize_scopes(once.clone());
    assert_eq!(once, vec!["b", "a", "c"]);
    assert_eq!(once, twice);
}

#[test]
fn test_normalize_absent_or_blank_is_empty() {
    assert!(normalize_scopes(RawScopes::Absent).is_empty());
    assert!(normalize_scopes(None::<String>).is_empty());
    assert!(normalize_scopes("   ").is_empty());
    assert!(normalize_scopes(Vec::<String>::new()).is_empty());
}

#[test]
fn test_parse_scopes_discards_malformed_entries() {
    let manager = manager();
    let parsed = manager.parse_scopes(&["user:read:basic", "bogus:scope", "user::x", "a:b:c:d"]);
    let originals: Vec<_> = parsed.iter().map(|p| p.original.as_str()).collect();
    assert_eq!(originals, vec!["user:read:basic", "a:b:c:d"]);
}

// ============================================================================
// Field resolution
// ============================================================================

#[test]
fn test_is_field_allowed_matches_direct_fields() {
    let manager = manager();
    assert_eq!(manager.is_field_allowed("profile", "bio"), vec!["bio"]);
    assert_eq!(manager.is_field_allowed(BASE_FIELDS, "birthDate"), vec!["birthDate"]);
    assert_eq!(manager.is_field_allowed("basic", "email"), vec!["email"]);
}

#[test]
fn test_is_field_allowed_expands_aliases() {
    let manager = manager();
    assert_eq!(
        manager.is_field_allowed("profile", "fullName"),
        vec!["firstName", "lastName"]
    );
    assert!(manager.is_field_allowed("basic", "fullName").is_empty());
}

#[test]
fn test_is_field_allowed_rejects_unknown_owner_and_field() {
    let manager = manager();
    assert!(manager.is_field_allowed("profile", "password").is_empty());
    assert!(manager.is_field_allowed("billing", "iban").is_empty());
    assert!(manager.is_field_allowed(BASE_FIELDS, "password").is_empty());
}

#[test]
fn test_resolve_follows_single_rule() {
    let manager = manager();

    assert_eq!(
        resolve(&manager, "user:read:profile:firstName"),
        ScopeResolution::RelationFields {
            relation: "profile".to_owned(),
            fields: vec!["firstName".to_owned()],
        }
    );
    assert_eq!(
        resolve(&manager, "user:read:identifiers"),
        ScopeResolution::Group(manager.scope("identifiers").unwrap())
    );
    assert_eq!(
        resolve(&manager, "user:read:email"),
        ScopeResolution::BaseFields(vec!["email".to_owned()])
    );
    assert_eq!(
        resolve(&manager, "user:write:basic"),
        ScopeResolution::Unresolved(UnresolvedReason::UnsupportedTarget {
            resource: "user".to_owned(),
            action: "write".to_owned(),
        })
    );
    assert_eq!(
        resolve(&manager, "user:read:profile:firstName:extra"),
        ScopeResolution::Unresolved(UnresolvedReason::PathTooDeep)
    );
    assert_eq!(
        resolve(&manager, "user:read:billing:iban"),
        ScopeResolution::Unresolved(UnresolvedReason::UnknownScope("billing".to_owned()))
    );
}

#[test]
fn test_resolve_hand_built_scope_without_path_is_unresolved() {
    let manager = manager();
    let scope = ParsedScope {
        original: "user:read".to_owned(),
        resource: "user".to_owned(),
        action: "read".to_owned(),
        path: Vec::new(),
    };
    let resolution = manager.resolve(&scope);
    assert_eq!(
        resolution,
        ScopeResolution::Unresolved(UnresolvedReason::EmptyPath)
    );
    assert_eq!(
        UnresolvedReason::EmptyPath.to_string(),
        "scope has no path"
    );
}

#[test]
fn test_relation_name_alone_is_treated_as_base_field() {
    let manager = manager();
    assert!(matches!(
        resolve(&manager, "user:read:profile"),
        ScopeResolution::Unresolved(UnresolvedReason::FieldNotAllowed { .. })
    ));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validate_scopes_partitions_requested_scopes() {
    let manager = manager();
    let validation = manager.validate_scopes(vec!["user:read:basic", "bogus:scope"]);

    assert!(!validation.valid);
    assert_eq!(validation.granted_scopes, vec!["user:read:basic"]);
    assert_eq!(
        validation.invalid_scopes,
        Some(vec!["bogus:scope".to_owned()])
    );
}

#[test]
fn test_validate_scopes_omits_invalid_list_when_all_granted() {
    let manager = manager();
    let validation =
        manager.validate_scopes("user:read:basic user:read:profile:fullName user:read:email");

    assert!(validation.valid);
    assert_eq!(validation.granted_scopes.len(), 3);
    assert_eq!(
        serde_json::to_value(&validation).unwrap(),
        json!({
            "valid": true,
            "grantedScopes": ["user:read:basic", "user:read:profile:fullName", "user:read:email"]
        })
    );
}

#[test]
fn test_validate_scopes_drops_disallowed_relation_field() {
    let manager = manager();
    let validation = manager.validate_scopes("user:read:profile:password");
    assert!(!validation.valid);
    assert!(validation.granted_scopes.is_empty());
}

#[test]
fn test_accessors_expose_catalogue() {
    let manager = manager();
    assert_eq!(manager.default_scopes(), ["user:read:basic".to_owned()]);
    assert_eq!(manager.available_scopes().len(), 3);
    assert!(manager.is_relation("identifiers"));
    assert!(!manager.is_relation("basic"));
    assert_eq!(
        manager.base_fields(),
        ["id", "email", "username", "birthDate"].map(str::to_owned)
    );
}

#[test]
fn test_from_catalogue_rejects_duplicate_identifiers() {
    let mut catalogue = sample_catalogue();
    let duplicate = catalogue.scopes[0].clone();
    catalogue.scopes.push(duplicate);

    let error = ScopeManager::from_catalogue(catalogue).unwrap_err();
    assert_eq!(error.code, ErrorCode::ConfigInvalid);
    assert!(error.message.contains("Duplicate scope identifier 'basic'"));
}
