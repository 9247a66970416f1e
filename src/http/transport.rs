// ABOUTME: Transport seam between the access layer and the network
// ABOUTME: Request description, raw response, transport errors and the reqwest implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};
use thiserror::Error;
use url::Url;

use super::client;
use crate::redaction::{redact_text, redact_url, RedactionConfig};

/// How an access token travels with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `Authorization: Bearer <token>`
    BearerHeader,
    /// Token as a query parameter (Graph-style `access_token=`)
    QueryParam(String),
}

impl TokenPlacement {
    /// Query placement using the conventional `access_token` parameter
    #[must_use]
    pub fn access_token_param() -> Self {
        Self::QueryParam("access_token".to_owned())
    }
}

/// A single HTTP request as seen by a transport
#[derive(Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Full URL including query parameters
    pub url: Url,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// URL-encoded form body
    pub form: Option<Vec<(String, String)>>,
    secrets: Vec<String>,
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.display_url())
            .field("headers", &self.headers.len())
            .field("has_form", &self.form.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiRequest {
    /// GET request
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: Vec::new(),
            form: None,
            secrets: Vec::new(),
        }
    }

    /// POST request with a form body
    #[must_use]
    pub const fn post_form(url: Url, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: Vec::new(),
            form: Some(form),
            secrets: Vec::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a query parameter
    #[must_use]
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Attach an access token and register it for redaction
    #[must_use]
    pub fn with_token(self, token: &str, placement: &TokenPlacement) -> Self {
        let request = match placement {
            TokenPlacement::BearerHeader => {
                self.with_header("Authorization", format!("Bearer {token}"))
            }
            TokenPlacement::QueryParam(name) => self.with_query(name, token),
        };
        request.with_secret(token)
    }

    /// Register a value that must never appear in diagnostics
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self
    }

    /// Registered secrets
    #[must_use]
    pub fn secrets(&self) -> &[String] {
        &self.secrets
    }

    /// URL with sensitive parameters and registered secrets removed
    #[must_use]
    pub fn display_url(&self) -> String {
        let config = RedactionConfig::default();
        let redacted = redact_url(&self.url, &config);
        redact_text(&redacted, &self.secrets, &config)
    }

    /// Redact registered secrets and token-looking strings from arbitrary text
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        redact_text(text, &self.secrets, &RedactionConfig::default())
    }
}

/// Status and raw body of an HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Unparsed body bytes
    pub body: Bytes,
}

impl RawResponse {
    /// Response from a status and body
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failure before any HTTP response was received
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),
    /// Transport-level timeout raised by the client itself
    #[error("request timed out")]
    Timeout,
    /// Any other network failure (reset, TLS, body read)
    #[error("request failed: {0}")]
    Request(String),
}

/// Sends a request and returns the raw response
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one HTTP exchange. Dropping the future must abort the request.
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(client::shared_client().clone())
    }
}

impl ReqwestTransport {
    /// Wrap an existing client
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    let error = error.without_url();
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(RawResponse { status, body })
    }
}
