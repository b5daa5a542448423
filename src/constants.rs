// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Environment variable names, scope reserved words and OAuth2 defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single flat list.

/// Environment variable names read by [`crate::config::environment::ServiceConfig`]
pub mod env_config {
    /// Deployment environment (development, production, testing)
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Path to the scope catalogue (JSON or YAML)
    pub const SCOPE_CATALOGUE: &str = "WARDEN_SCOPE_CATALOGUE";
    /// HMAC secret for signing access tokens
    pub const TOKEN_SECRET: &str = "WARDEN_TOKEN_SECRET";
    /// Access token lifetime in seconds
    pub const ACCESS_TOKEN_TTL_SECS: &str = "WARDEN_ACCESS_TOKEN_TTL_SECS";
    /// Authorization code lifetime in seconds
    pub const AUTH_CODE_TTL_SECS: &str = "WARDEN_AUTH_CODE_TTL_SECS";
    /// Secret used to encrypt client tokens for the browser redirect leg
    pub const CLIENT_TOKEN_SECRET: &str = "WARDEN_CLIENT_TOKEN_SECRET";
    /// Path of the sign-in page
    pub const SIGN_IN_PATH: &str = "WARDEN_SIGN_IN_PATH";
    /// Maximum concurrent webhook deliveries per callback
    pub const CALLBACK_CONCURRENCY: &str = "WARDEN_CALLBACK_CONCURRENCY";
    /// Per-request webhook timeout in seconds
    pub const CALLBACK_TIMEOUT_SECS: &str = "WARDEN_CALLBACK_TIMEOUT_SECS";
}

/// Scope string grammar and reserved identifiers
pub mod scopes {
    /// Separator between `resource:action:path` segments
    pub const SEGMENT_SEPARATOR: char = ':';
    /// Minimum number of segments in a well-formed scope
    pub const MIN_SEGMENTS: usize = 3;
    /// The only resource interpreted by the user data fetcher
    pub const USER_RESOURCE: &str = "user";
    /// The only action interpreted by the user data fetcher
    pub const READ_ACTION: &str = "read";
    /// Pseudo-scope holding every base field of every scope
    pub const BASE_FIELDS: &str = "BASE_FIELDS";
    /// Primary key always selected on users and relations
    pub const ID_FIELD: &str = "id";

    pub use warden_core::models::DEFAULT_FOREIGN_KEY;
}

/// OAuth 2.0 defaults
pub mod oauth2 {
    /// Sentinel client ID written into tokens issued without a client
    pub const NO_CLIENT: &str = "NA";
    /// Token type reported in token responses
    pub const BEARER: &str = "Bearer";
    /// Default access token lifetime (1 hour)
    pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;
    /// Default authorization code lifetime (5 minutes)
    pub const DEFAULT_AUTH_CODE_TTL_SECS: i64 = 300;
    /// Upper bound accepted for configured token and code lifetimes (1 year)
    pub const MAX_TOKEN_TTL_SECS: i64 = 31_536_000;
    /// Default sign-in page path
    pub const DEFAULT_SIGN_IN_PATH: &str = "/oauth2/sign-in";
    /// Grant type names as registered on clients
    pub mod grants {
        /// Authorization code grant
        pub const AUTHORIZATION_CODE: &str = "authorization_code";
        /// Resource owner password grant
        pub const PASSWORD: &str = "password";
        /// Client credentials grant
        pub const CLIENT_CREDENTIALS: &str = "client_credentials";
    }
}

/// Client webhook delivery
pub mod callbacks {
    /// Maximum webhook requests in flight for a single client callback
    pub const DEFAULT_CONCURRENCY: usize = 5;
    /// Default per-request timeout
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
    /// Header carrying the public client ID on webhook requests
    pub const CLIENT_ID_HEADER: &str = "x-warden-client-id";
}

/// Service identity used in logs
pub mod service_names {
    /// Service name
    pub const WARDEN: &str = "warden-oauth2";
}
