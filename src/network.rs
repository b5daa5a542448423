// ABOUTME: Outbound HTTP abstraction used for client webhook delivery
// ABOUTME: NetworkClient trait plus a reqwest implementation with a per-request timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method};
use serde_json::Value;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::errors::{AppError, AppResult};

/// HTTP method of an outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    #[default]
    Post,
    /// PUT
    Put,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        })
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
        }
    }
}

/// Outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRequest {
    /// Method
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    /// JSON body
    pub body: Option<Value>,
    /// Extra headers
    pub headers: BTreeMap<String, String>,
}

impl NetworkRequest {
    /// JSON POST request
    #[must_use]
    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: Some(body),
            headers: BTreeMap::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Response of a successful request
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body, `Null` when empty or not JSON
    pub data: Value,
}

/// Outbound HTTP client
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Send a request
    ///
    /// # Errors
    ///
    /// Returns an `ExternalServiceError` on transport failure, timeout or a non-2xx status
    async fn send(&self, request: NetworkRequest) -> AppResult<NetworkResponse>;
}

/// `NetworkClient` over a pooled `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestNetworkClient {
    client: Client,
}

impl ReqwestNetworkClient {
    /// Create a client with the given per-request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a client using the configured webhook timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized
    pub fn from_config(config: &ServiceConfig) -> AppResult<Self> {
        Self::new(config.callbacks.timeout)
    }
}

#[async_trait]
impl NetworkClient for ReqwestNetworkClient {
    async fn send(&self, request: NetworkRequest) -> AppResult<NetworkResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            AppError::external_service(&request.url, format!("{} failed: {e}", request.method))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::external_service(&request.url, format!("Failed to read response: {e}"))
        })?;

        debug!(url = %request.url, status = status.as_u16(), "Outbound request completed");

        if !status.is_success() {
            return Err(AppError::external_service(
                &request.url,
                format!("Unexpected status {status}"),
            ));
        }

        Ok(NetworkResponse {
            status: status.as_u16(),
            data: serde_json::from_str(&text).unwrap_or(Value::Null),
        })
    }
}
