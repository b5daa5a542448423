// ABOUTME: Scope catalogue document loading from JSON or YAML files
// ABOUTME: Picks the format from the file extension and reads asynchronously via tokio
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::Path;

use tracing::info;
use warden_core::models::ScopeCatalogue;

use crate::errors::{AppError, AppResult};

/// Serialization format of a catalogue document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogueFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl CatalogueFormat {
    /// Detect the format from a path's extension
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error for any other extension
    pub fn from_path(path: &Path) -> AppResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(AppError::config(format!(
                "Unsupported scope catalogue format: {} (expected .json, .yaml or .yml)",
                path.display()
            ))),
        }
    }
}

/// Parse a catalogue document
///
/// # Errors
///
/// Returns a `ConfigInvalid` error if the document does not match the catalogue schema
pub fn parse_catalogue(content: &str, format: CatalogueFormat) -> AppResult<ScopeCatalogue> {
    let parsed = match format {
        CatalogueFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        CatalogueFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| AppError::config(format!("Malformed scope catalogue: {e}")))
}

/// Read and parse a catalogue file
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unknown extension or is malformed
pub async fn load_catalogue(path: impl AsRef<Path>) -> AppResult<ScopeCatalogue> {
    let path = path.as_ref();
    let format = CatalogueFormat::from_path(path)?;

    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::config(format!(
            "Failed to read scope catalogue {}: {e}",
            path.display()
        ))
    })?;

    let catalogue = parse_catalogue(&content, format)?;
    info!(
        path = %path.display(),
        scopes = catalogue.scopes.len(),
        default_scopes = catalogue.default_scopes.len(),
        "Scope catalogue loaded"
    );
    Ok(catalogue)
}
