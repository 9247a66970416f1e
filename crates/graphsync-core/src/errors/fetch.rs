// ABOUTME: Classification of a single upstream HTTP call
// ABOUTME: Maps status codes and transport failures onto retryable / terminal kinds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ErrorCode;

/// Outcome classification for one fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Successful response with a parseable body
    None,
    /// Attempt exceeded its deadline
    Timeout,
    /// Upstream answered 401 or 403
    AuthExpired,
    /// Upstream answered 429
    RateLimited,
    /// Upstream answered 5xx
    ServerError,
    /// No HTTP response at all (DNS, connect, reset)
    NetworkError,
    /// A 2xx body that is not valid JSON
    MalformedBody,
    /// Any other 4xx response
    ClientError,
}

impl FetchErrorKind {
    /// Classify an HTTP status code (body parsing is judged separately)
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::None,
            401 | 403 => Self::AuthExpired,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::ClientError,
        }
    }

    /// Whether `BackoffFetcher` retries this kind locally
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimited | Self::ServerError | Self::NetworkError
        )
    }

    /// `true` for the success classification
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Closest `ErrorCode` for surfacing at the edge
    #[must_use]
    pub const fn error_code(self) -> ErrorCode {
        match self {
            Self::None => ErrorCode::InternalError,
            Self::AuthExpired => ErrorCode::ExternalAuthFailed,
            Self::RateLimited => ErrorCode::ExternalRateLimited,
            Self::Timeout | Self::ServerError | Self::NetworkError => {
                ErrorCode::ExternalServiceUnavailable
            }
            Self::MalformedBody | Self::ClientError => ErrorCode::ExternalServiceError,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Timeout => "timeout",
            Self::AuthExpired => "auth_expired",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::NetworkError => "network_error",
            Self::MalformedBody => "malformed_body",
            Self::ClientError => "client_error",
        };
        f.write_str(name)
    }
}
