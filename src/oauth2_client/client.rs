// ABOUTME: OAuth 2.0 refresh-token grant client used by the token refresh coordinator
// ABOUTME: Sends refresh requests through BackoffFetcher and classifies upstream rejections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::config::TokenConfig;
use crate::constants::tokens::{MAX_TOKEN_LIFETIME_SECS, REFRESH_GRANT_TYPE};
use crate::errors::FetchErrorKind;
use crate::http::{ApiRequest, BackoffFetcher, FetchOutcome};

/// Tokens returned by a successful refresh
#[derive(Clone)]
pub struct TokenGrant {
    /// New access token
    pub access_token: String,
    /// Rotated refresh token, when the provider issues one
    pub refresh_token: Option<String>,
    /// Lifetime of the new access token
    pub expires_in: Option<Duration>,
    /// Token type (usually "Bearer")
    pub token_type: Option<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("expires_in", &self.expires_in)
            .field("rotated_refresh_token", &self.refresh_token.is_some())
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// Why a refresh did not produce a token
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// The refresh token was consumed by a racing refresh elsewhere
    #[error("refresh token already used: {detail}")]
    AlreadyUsed {
        /// Redacted upstream message
        detail: String,
    },
    /// The refresh token was rejected (revoked, expired, invalid client)
    #[error("refresh token rejected: {detail}")]
    Rejected {
        /// Redacted upstream message
        detail: String,
    },
    /// The token endpoint could not give an answer
    #[error("token endpoint unavailable ({kind}): {detail}")]
    Unavailable {
        /// Fetch classification of the failed call
        kind: FetchErrorKind,
        /// Redacted diagnostic
        detail: String,
    },
}

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Perform one refresh for `subject_id`
    async fn refresh(&self, subject_id: &str, refresh_token: &str)
        -> Result<TokenGrant, RefreshError>;
}

/// How the token endpoint expects the refresh request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshRequestStyle {
    /// Standard `grant_type=refresh_token` form POST with client credentials
    FormPost,
    /// GET with the long-lived token as `access_token` (Instagram Graph style)
    QueryGet {
        /// `grant_type` value sent with the request
        grant_type: String,
    },
}

/// Token endpoint configuration
#[derive(Clone)]
pub struct OAuth2Config {
    /// Client identifier
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Token endpoint
    pub token_url: Url,
    /// Request shape
    pub style: RefreshRequestStyle,
}

impl fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url.as_str())
            .field("style", &self.style)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<Value>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Refresh client backed by `BackoffFetcher`
pub struct OAuth2RefreshClient {
    config: OAuth2Config,
    tokens: TokenConfig,
    fetcher: BackoffFetcher,
}

impl OAuth2RefreshClient {
    /// Create a refresh client
    #[must_use]
    pub const fn new(config: OAuth2Config, tokens: TokenConfig, fetcher: BackoffFetcher) -> Self {
        Self {
            config,
            tokens,
            fetcher,
        }
    }

    /// Token endpoint configuration
    #[must_use]
    pub const fn config(&self) -> &OAuth2Config {
        &self.config
    }

    fn build_request(&self, refresh_token: &str) -> ApiRequest {
        let request = match &self.config.style {
            RefreshRequestStyle::FormPost => ApiRequest::post_form(
                self.config.token_url.clone(),
                vec![
                    ("client_id".to_owned(), self.config.client_id.clone()),
                    ("client_secret".to_owned(), self.config.client_secret.clone()),
                    ("refresh_token".to_owned(), refresh_token.to_owned()),
                    ("grant_type".to_owned(), REFRESH_GRANT_TYPE.to_owned()),
                ],
            )
            .with_header("Accept", "application/json"),
            RefreshRequestStyle::QueryGet { grant_type } => {
                ApiRequest::get(self.config.token_url.clone())
                    .with_query("grant_type", grant_type)
                    .with_query("access_token", refresh_token)
            }
        };
        request
            .with_secret(refresh_token)
            .with_secret(self.config.client_secret.clone())
    }

    fn classify_failure(&self, request: &ApiRequest, outcome: &FetchOutcome) -> RefreshError {
        let detail = request.redact(&upstream_error_text(outcome));
        match (outcome.classified_error, outcome.http_status) {
            (FetchErrorKind::ClientError | FetchErrorKind::AuthExpired, Some(_)) => {
                if self.tokens.is_already_used(&detail) {
                    RefreshError::AlreadyUsed { detail }
                } else {
                    RefreshError::Rejected { detail }
                }
            }
            (kind, _) => RefreshError::Unavailable { kind, detail },
        }
    }
}

/// Pull the most descriptive error text out of an OAuth or Graph error body
fn upstream_error_text(outcome: &FetchOutcome) -> String {
    let body = outcome.body_or_null();
    let error = &body["error"];
    let parts: Vec<&str> = [
        error.as_str(),
        body["error_description"].as_str(),
        error["message"].as_str(),
        error["error_user_msg"].as_str(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        outcome.describe()
    } else {
        parts.join(": ")
    }
}

/// Lifetime from an `expires_in` value, clamped to [`MAX_TOKEN_LIFETIME_SECS`]
fn parse_expires_in(raw: Option<&Value>) -> Option<Duration> {
    let seconds: i64 = match raw? {
        Value::Number(number) => number.as_i64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    if seconds <= 0 {
        return None;
    }
    Duration::try_seconds(seconds.min(MAX_TOKEN_LIFETIME_SECS))
}

#[async_trait]
impl TokenRefresher for OAuth2RefreshClient {
    async fn refresh(
        &self,
        subject_id: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, RefreshError> {
        let request = self.build_request(refresh_token);
        let outcome = self.fetcher.fetch(&request).await;

        if !outcome.ok {
            let error = self.classify_failure(&request, &outcome);
            warn!(subject = subject_id, error = %error, "Token refresh request failed");
            return Err(error);
        }

        let response: TokenResponse = serde_json::from_value(outcome.body_or_null().clone())
            .map_err(|e| RefreshError::Unavailable {
                kind: FetchErrorKind::MalformedBody,
                detail: format!("unexpected token response: {e}"),
            })?;

        Ok(TokenGrant {
            expires_in: parse_expires_in(response.expires_in.as_ref()),
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type,
        })
    }
}
