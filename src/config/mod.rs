// ABOUTME: Environment-driven configuration for the access layer components
// ABOUTME: Aggregates HTTP, retry, token, pagination and identity cache settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration for the graphsync access layer.
//!
//! Everything is read from `GRAPHSYNC_*` environment variables (see
//! [`crate::constants::env_config`]). Missing variables fall back to the
//! defaults in [`crate::constants`]; malformed values are reported as
//! `ConfigInvalid` errors rather than silently ignored.

/// Identity cache freshness and cooldown settings
pub mod identity;
/// HTTP client and retry settings
pub mod network;
/// Pagination traversal defaults
pub mod pagination;
/// Credential refresh settings
pub mod tokens;

pub use identity::IdentityCacheConfig;
pub use network::{HttpClientConfig, RetryPolicy};
pub use pagination::PaginationConfig;
pub use tokens::TokenConfig;

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::debug;

use crate::errors::{AppError, AppResult};

/// Complete access layer configuration
#[derive(Debug, Clone, Default)]
pub struct AccessLayerConfig {
    /// Shared HTTP client timeouts
    pub http: HttpClientConfig,
    /// Retry policy for `BackoffFetcher`
    pub retry: RetryPolicy,
    /// Credential refresh policy
    pub tokens: TokenConfig,
    /// Pagination defaults
    pub pagination: PaginationConfig,
    /// Identity cache policy
    pub identity: IdentityCacheConfig,
}

impl AccessLayerConfig {
    /// Load every section from the environment
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error if any variable is present but malformed
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            http: HttpClientConfig::from_env()?,
            retry: RetryPolicy::from_env()?,
            tokens: TokenConfig::from_env()?,
            pagination: PaginationConfig::from_env()?,
            identity: IdentityCacheConfig::from_env()?,
        };
        debug!(?config, "Loaded access layer configuration");
        Ok(config)
    }
}

/// Read an environment variable, falling back to `default` when unset
pub(crate) fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
pub(crate) fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}
