// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses token secrets, lifetimes, catalogue location and webhook limits from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::constants::{callbacks, env_config, oauth2};
use crate::errors::{AppError, AppResult};

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    /// Local development: missing secrets are generated
    Development,
    /// Production: every secret must be configured
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Access token and authorization code settings
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret for access token signatures
    pub signing_secret: Zeroizing<String>,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Authorization code lifetime in seconds
    pub auth_code_ttl_secs: i64,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_secret", &"[REDACTED]")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("auth_code_ttl_secs", &self.auth_code_ttl_secs)
            .finish()
    }
}

/// Browser redirect leg settings
#[derive(Clone)]
pub struct ClientTokenConfig {
    /// Secret for the symmetric client-token cipher
    pub secret: Zeroizing<String>,
    /// Sign-in page path the request path points at
    pub sign_in_path: String,
}

impl fmt::Debug for ClientTokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTokenConfig")
            .field("secret", &"[REDACTED]")
            .field("sign_in_path", &self.sign_in_path)
            .finish()
    }
}

/// Client webhook delivery settings
#[derive(Debug, Clone, Copy)]
pub struct CallbackConfig {
    /// Maximum deliveries in flight per callback
    pub concurrency: usize,
    /// Per-request timeout of the network client
    pub timeout: Duration,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            concurrency: callbacks::DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(callbacks::DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Location of the scope catalogue
    pub scope_catalogue_path: PathBuf,
    /// Token settings
    pub tokens: TokenConfig,
    /// Client token settings
    pub client_tokens: ClientTokenConfig,
    /// Webhook settings
    pub callbacks: CallbackConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `WARDEN_SCOPE_CATALOGUE` is unset
    /// - A secret is unset in production
    /// - A numeric variable cannot be parsed or is out of range
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let environment = Environment::from_str_or_default(&env_var_or(
            env_config::ENVIRONMENT,
            "development",
        ));

        let scope_catalogue_path = env::var(env_config::SCOPE_CATALOGUE)
            .map(PathBuf::from)
            .map_err(|_| AppError::config_missing(env_config::SCOPE_CATALOGUE))?;

        let tokens = TokenConfig {
            signing_secret: secret_from_env(env_config::TOKEN_SECRET, environment)?,
            access_token_ttl_secs: parse_positive(
                env_config::ACCESS_TOKEN_TTL_SECS,
                oauth2::DEFAULT_ACCESS_TOKEN_TTL_SECS,
            )?,
            auth_code_ttl_secs: parse_positive(
                env_config::AUTH_CODE_TTL_SECS,
                oauth2::DEFAULT_AUTH_CODE_TTL_SECS,
            )?,
        };

        let client_tokens = ClientTokenConfig {
            secret: secret_from_env(env_config::CLIENT_TOKEN_SECRET, environment)?,
            sign_in_path: env_var_or(env_config::SIGN_IN_PATH, oauth2::DEFAULT_SIGN_IN_PATH),
        };

        let concurrency: usize =
            parse_env(env_config::CALLBACK_CONCURRENCY, callbacks::DEFAULT_CONCURRENCY)?;
        if concurrency == 0 {
            return Err(AppError::config(format!(
                "{} must be at least 1",
                env_config::CALLBACK_CONCURRENCY
            )));
        }
        let timeout_secs: u64 = parse_env(
            env_config::CALLBACK_TIMEOUT_SECS,
            callbacks::DEFAULT_TIMEOUT_SECS,
        )?;

        let config = Self {
            environment,
            scope_catalogue_path,
            tokens,
            client_tokens,
            callbacks: CallbackConfig {
                concurrency,
                timeout: Duration::from_secs(timeout_secs),
            },
        };

        info!(
            environment = %config.environment,
            catalogue = %config.scope_catalogue_path.display(),
            access_token_ttl_secs = config.tokens.access_token_ttl_secs,
            callback_concurrency = config.callbacks.concurrency,
            "Configuration loaded"
        );

        Ok(config)
    }
}

/// Read an environment variable, falling back to `default`
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse a strictly positive lifetime no longer than [`oauth2::MAX_TOKEN_TTL_SECS`]
fn parse_positive(key: &str, default: i64) -> AppResult<i64> {
    let value: i64 = parse_env(key, default)?;
    if value <= 0 {
        return Err(AppError::config(format!("{key} must be positive")));
    }
    if value > oauth2::MAX_TOKEN_TTL_SECS {
        return Err(AppError::config(format!(
            "{key} must not exceed {} seconds",
            oauth2::MAX_TOKEN_TTL_SECS
        )));
    }
    Ok(value)
}

/// Read a secret; development and testing environments get a random one when unset
fn secret_from_env(key: &str, environment: Environment) -> AppResult<Zeroizing<String>> {
    match env::var(key) {
        Ok(secret) if !secret.trim().is_empty() => Ok(Zeroizing::new(secret)),
        _ if environment.is_production() => Err(AppError::config_missing(key)),
        _ => {
            warn!(
                variable = key,
                "Secret not configured, generating an ephemeral one (development only)"
            );
            Ok(generate_secret())
        }
    }
}

/// Random 256-bit secret, base64 encoded
fn generate_secret() -> Zeroizing<String> {
    let mut bytes = Zeroizing::new([0u8; 32]);
    rand::thread_rng().fill_bytes(&mut *bytes);
    Zeroizing::new(general_purpose::STANDARD.encode(*bytes))
}
