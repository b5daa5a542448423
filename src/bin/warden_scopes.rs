// ABOUTME: Operator CLI for scope catalogues: validation, scope checks and query plans
// ABOUTME: Prints JSON reports so catalogue changes can be reviewed before deployment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Usage:
//! ```bash
//! # Validate a catalogue, exit non-zero on fatal issues
//! cargo run --bin warden-scopes -- --catalogue scopes.yaml validate
//!
//! # Show which requested scopes would be granted
//! cargo run --bin warden-scopes -- check user:read:basic user:read:profile:firstName
//!
//! # Show the query the user data fetcher would run
//! cargo run --bin warden-scopes -- plan --user-id u-1 user:read:identifiers
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use warden_oauth2::constants::env_config;
use warden_oauth2::logging::{LogFormat, LoggingConfig};
use warden_oauth2::scopes::{load_catalogue, ScopeConfigValidator, ScopeManager};
use warden_oauth2::user_data::{QueryStructure, RelationIndex};

#[derive(Parser)]
#[command(
    name = "warden-scopes",
    about = "Warden scope catalogue tooling",
    long_about = "Validate scope catalogues, check requested scopes and preview user data queries."
)]
struct ScopesArgs {
    #[command(subcommand)]
    command: ScopesCommand,

    /// Catalogue file (defaults to WARDEN_SCOPE_CATALOGUE)
    #[arg(long, short = 'c', global = true)]
    catalogue: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum ScopesCommand {
    /// Validate the catalogue structure
    Validate,

    /// Partition scopes into granted and invalid
    Check {
        /// Requested scopes
        #[arg(required = true)]
        scopes: Vec<String>,
    },

    /// Print the query plan for a set of granted scopes
    Plan {
        /// Render the repository filter for this user ID as well
        #[arg(long)]
        user_id: Option<String>,

        /// Granted scopes; empty uses the catalogue's default scopes
        scopes: Vec<String>,
    },
}

fn catalogue_path(args: &ScopesArgs) -> Result<PathBuf> {
    args.catalogue
        .clone()
        .or_else(|| env::var(env_config::SCOPE_CATALOGUE).ok().map(PathBuf::from))
        .with_context(|| {
            format!(
                "No catalogue given: pass --catalogue or set {}",
                env_config::SCOPE_CATALOGUE
            )
        })
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ScopesArgs::parse();

    let logging = LoggingConfig {
        level: if args.verbose { "debug" } else { "warn" }.to_owned(),
        format: LogFormat::Compact,
        ..LoggingConfig::default()
    };
    logging.init()?;

    let path = catalogue_path(&args)?;

    match args.command {
        ScopesCommand::Validate => {
            let catalogue = load_catalogue(&path).await?;
            let report = ScopeConfigValidator::validate(&catalogue);
            print_json(&report)?;
            if !report.is_valid() {
                bail!(
                    "{} has {} error(s) and {} warning(s)",
                    path.display(),
                    report.errors.len(),
                    report.warnings.len()
                );
            }
            info!(path = %path.display(), warnings = report.warnings.len(), "Catalogue is valid");
        }
        ScopesCommand::Check { scopes } => {
            let manager = ScopeManager::load(&path).await?;
            let validation = manager.validate_scopes(scopes);
            if !validation.valid {
                warn!("Some requested scopes would be dropped");
            }
            print_json(&validation)?;
        }
        ScopesCommand::Plan { user_id, scopes } => {
            let manager = ScopeManager::load(&path).await?;
            let relations = RelationIndex::from_manager(&manager);
            let query = if scopes.is_empty() {
                QueryStructure::plan(&manager, &relations, manager.default_scopes())
            } else {
                QueryStructure::plan(&manager, &relations, &scopes)
            };
            match user_id {
                Some(user_id) => print_json(&json!({
                    "query": query,
                    "filter": query.to_filter(&user_id),
                }))?,
                None => print_json(&query)?,
            }
        }
    }

    Ok(())
}
