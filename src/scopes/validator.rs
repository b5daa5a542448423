// ABOUTME: Startup validation of the scope catalogue structure
// ABOUTME: Collects field-level issues, logs warnings and fails fast on fatal errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::json;
use tracing::warn;
use warden_core::models::{RelationKind, RelationScopeDefinition, ScopeCatalogue, ScopeDefinition};

use super::parse::ParsedScope;
use crate::constants::scopes::{BASE_FIELDS, READ_ACTION, SEGMENT_SEPARATOR, USER_RESOURCE};
use crate::errors::{AppError, AppResult};

/// How serious a catalogue issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// The catalogue must not be served
    Error,
    /// Suspicious but usable
    Warning,
}

/// A single catalogue problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeConfigIssue {
    /// Path of the offending value, e.g. `scopes[2].relations[0].groupBy`
    pub field: String,
    /// What is wrong
    pub message: String,
    /// Scope the issue belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_identifier: Option<String>,
    /// Severity
    pub severity: IssueSeverity,
}

/// Result of validating a catalogue
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Fatal issues
    pub errors: Vec<ScopeConfigIssue>,
    /// Non-fatal issues
    pub warnings: Vec<ScopeConfigIssue>,
}

impl ValidationReport {
    /// No fatal issues
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(
        &mut self,
        severity: IssueSeverity,
        field: impl Into<String>,
        scope: Option<&str>,
        message: impl Into<String>,
    ) {
        let issue = ScopeConfigIssue {
            field: field.into(),
            message: message.into(),
            scope_identifier: scope.map(str::to_owned),
            severity,
        };
        match severity {
            IssueSeverity::Error => self.errors.push(issue),
            IssueSeverity::Warning => self.warnings.push(issue),
        }
    }

    fn error(&mut self, field: impl Into<String>, scope: Option<&str>, message: impl Into<String>) {
        self.push(IssueSeverity::Error, field, scope, message);
    }

    fn warning(
        &mut self,
        field: impl Into<String>,
        scope: Option<&str>,
        message: impl Into<String>,
    ) {
        self.push(IssueSeverity::Warning, field, scope, message);
    }
}

/// Structural validator for [`ScopeCatalogue`]
pub struct ScopeConfigValidator;

impl ScopeConfigValidator {
    /// Validate a catalogue and collect every issue
    #[must_use]
    pub fn validate(catalogue: &ScopeCatalogue) -> ValidationReport {
        let mut report = ValidationReport::default();

        if catalogue.scopes.is_empty() {
            report.error("scopes", None, "Catalogue defines no scopes");
        }

        let mut identifiers = HashSet::new();
        let mut first_relations: HashMap<&str, &RelationScopeDefinition> = HashMap::new();

        for (index, scope) in catalogue.scopes.iter().enumerate() {
            let prefix = format!("scopes[{index}]");
            Self::check_identifier(&mut report, &prefix, scope);

            if !scope.identifier.is_empty() && !identifiers.insert(scope.identifier.as_str()) {
                report.error(
                    format!("{prefix}.identifier"),
                    Some(&scope.identifier),
                    format!("Duplicate scope identifier '{}'", scope.identifier),
                );
            }

            if scope.name.trim().is_empty() {
                report.error(
                    format!("{prefix}.name"),
                    Some(&scope.identifier),
                    "Scope name must not be empty",
                );
            }

            if scope.fields.is_empty() && scope.relations.is_empty() {
                report.warning(
                    &prefix,
                    Some(&scope.identifier),
                    "Scope grants no fields and no relations",
                );
            }

            Self::check_fields(&mut report, &format!("{prefix}.fields"), scope, &scope.fields);
            Self::check_relations(&mut report, &prefix, scope, &mut first_relations);
        }

        Self::check_default_scopes(&mut report, catalogue, &first_relations);
        Self::check_aliases(&mut report, catalogue);

        report
    }

    /// Validate, log warnings and fail on any fatal issue
    ///
    /// # Errors
    ///
    /// Returns a single `ConfigInvalid` error aggregating every fatal issue; the
    /// issues are attached as structured details
    pub fn validate_or_throw(catalogue: &ScopeCatalogue) -> AppResult<ValidationReport> {
        let report = Self::validate(catalogue);

        for issue in &report.warnings {
            warn!(
                field = %issue.field,
                scope = issue.scope_identifier.as_deref().unwrap_or("-"),
                "Scope catalogue warning: {}",
                issue.message
            );
        }

        if report.is_valid() {
            return Ok(report);
        }

        let summary = report
            .errors
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("; ");

        Err(AppError::config(format!(
            "Scope catalogue has {} error(s): {summary}",
            report.errors.len()
        ))
        .with_details(json!({ "errors": report.errors })))
    }

    fn check_identifier(report: &mut ValidationReport, prefix: &str, scope: &ScopeDefinition) {
        let identifier = scope.identifier.as_str();
        let field = format!("{prefix}.identifier");

        if identifier.trim().is_empty() {
            report.error(field, None, "Scope identifier must not be empty");
        } else if identifier.contains(SEGMENT_SEPARATOR)
            || identifier.chars().any(char::is_whitespace)
        {
            report.error(
                field,
                Some(identifier),
                "Scope identifier must not contain ':' or whitespace",
            );
        } else if identifier == BASE_FIELDS {
            report.error(
                field,
                Some(identifier),
                format!("'{BASE_FIELDS}' is reserved"),
            );
        }
    }

    fn check_fields(
        report: &mut ValidationReport,
        prefix: &str,
        scope: &ScopeDefinition,
        fields: &[String],
    ) {
        let mut seen = HashSet::new();
        for (index, field) in fields.iter().enumerate() {
            if field.trim().is_empty() {
                report.error(
                    format!("{prefix}[{index}]"),
                    Some(&scope.identifier),
                    "Field name must not be empty",
                );
            } else if !seen.insert(field.as_str()) {
                report.warning(
                    format!("{prefix}[{index}]"),
                    Some(&scope.identifier),
                    format!("Field '{field}' is listed more than once"),
                );
            }
        }
    }

    fn check_relations<'a>(
        report: &mut ValidationReport,
        prefix: &str,
        scope: &'a ScopeDefinition,
        first_relations: &mut HashMap<&'a str, &'a RelationScopeDefinition>,
    ) {
        let mut names = HashSet::new();

        for (index, relation) in scope.relations.iter().enumerate() {
            let rel_prefix = format!("{prefix}.relations[{index}]");
            let name = relation.relation.as_str();

            if name.trim().is_empty() {
                report.error(
                    format!("{rel_prefix}.relation"),
                    Some(&scope.identifier),
                    "Relation name must not be empty",
                );
                continue;
            }

            if !names.insert(name) {
                report.error(
                    format!("{rel_prefix}.relation"),
                    Some(&scope.identifier),
                    format!("Relation '{name}' is declared more than once in this scope"),
                );
            }

            match (relation.kind, relation.group_by.as_deref()) {
                (RelationKind::HasMany, None | Some("")) => report.error(
                    format!("{rel_prefix}.groupBy"),
                    Some(&scope.identifier),
                    format!("hasMany relation '{name}' requires groupBy"),
                ),
                (RelationKind::HasOne, Some(_)) => report.warning(
                    format!("{rel_prefix}.groupBy"),
                    Some(&scope.identifier),
                    format!("groupBy is ignored on hasOne relation '{name}'"),
                ),
                _ => {}
            }

            if relation.fields.is_empty() {
                report.warning(
                    format!("{rel_prefix}.fields"),
                    Some(&scope.identifier),
                    format!("Relation '{name}' grants no fields"),
                );
            }
            Self::check_fields(
                report,
                &format!("{rel_prefix}.fields"),
                scope,
                &relation.fields,
            );

            match first_relations.get(name) {
                Some(first)
                    if first.kind != relation.kind
                        || first.group_by != relation.group_by
                        || first.foreign_key() != relation.foreign_key() =>
                {
                    report.warning(
                        &rel_prefix,
                        Some(&scope.identifier),
                        format!(
                            "Relation '{name}' conflicts with an earlier definition; the first one wins"
                        ),
                    );
                }
                Some(_) => {}
                None => {
                    first_relations.insert(name, relation);
                }
            }
        }
    }

    fn check_default_scopes(
        report: &mut ValidationReport,
        catalogue: &ScopeCatalogue,
        relations: &HashMap<&str, &RelationScopeDefinition>,
    ) {
        let base_fields: HashSet<&str> = catalogue
            .scopes
            .iter()
            .flat_map(|s| s.fields.iter().map(String::as_str))
            .collect();

        for (index, scope) in catalogue.default_scopes.iter().enumerate() {
            let field = format!("defaultScopes[{index}]");
            let Some(parsed) = ParsedScope::parse(scope) else {
                report.error(field, None, format!("Default scope '{scope}' is malformed"));
                continue;
            };
            if !parsed.targets(USER_RESOURCE, READ_ACTION) {
                report.warning(
                    field,
                    None,
                    format!("Default scope '{scope}' is not a user:read scope and grants nothing"),
                );
                continue;
            }
            let Some(head) = parsed.path.first().map(String::as_str) else {
                continue;
            };
            let known = catalogue.scope(head).is_some()
                || relations.contains_key(head)
                || base_fields.contains(head);
            if !known {
                report.error(
                    field,
                    None,
                    format!("Default scope '{scope}' references unknown scope '{head}'"),
                );
            }
        }
    }

    fn check_aliases(report: &mut ValidationReport, catalogue: &ScopeCatalogue) {
        let known_fields: HashSet<&str> = catalogue
            .scopes
            .iter()
            .flat_map(|s| {
                s.fields
                    .iter()
                    .chain(s.relations.iter().flat_map(|r| r.fields.iter()))
                    .map(String::as_str)
            })
            .collect();

        for (alias, targets) in &catalogue.aliases {
            let field = format!("aliases.{alias}");
            if targets.is_empty() {
                report.error(field, None, format!("Alias '{alias}' has no target fields"));
                continue;
            }
            for target in targets {
                if !known_fields.contains(target.as_str()) {
                    report.warning(
                        &field,
                        None,
                        format!("Alias '{alias}' targets '{target}', which no scope grants"),
                    );
                }
            }
        }
    }
}
