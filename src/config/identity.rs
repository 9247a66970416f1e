// ABOUTME: Identity cache freshness and failure cooldown configuration
// ABOUTME: General TTL, high-value field revalidation window, failure cap and cooldown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Duration;

use super::parse_env;
use crate::constants::{env_config, identity};
use crate::errors::{AppError, AppResult};

/// Identity cache policy
#[derive(Debug, Clone)]
pub struct IdentityCacheConfig {
    /// Age after which a whole record is refetched
    pub ttl: Duration,
    /// Age after which a record carrying the high-value field is refetched
    pub high_value_refresh_window: Duration,
    /// Consecutive failures before the cooldown kicks in
    pub max_failures: u32,
    /// Minimum wait after the last failure once `max_failures` is reached
    pub failure_cooldown: Duration,
}

impl Default for IdentityCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(identity::DEFAULT_TTL_SECS),
            high_value_refresh_window: Duration::seconds(identity::DEFAULT_HIGH_VALUE_REFRESH_SECS),
            max_failures: identity::DEFAULT_MAX_FAILURES,
            failure_cooldown: Duration::seconds(identity::DEFAULT_FAILURE_COOLDOWN_SECS),
        }
    }
}

impl IdentityCacheConfig {
    /// Load identity cache configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is malformed or the high-value window
    /// is not shorter than the TTL
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            ttl: Duration::seconds(parse_env(
                env_config::IDENTITY_TTL_SECS,
                identity::DEFAULT_TTL_SECS,
            )?),
            high_value_refresh_window: Duration::seconds(parse_env(
                env_config::IDENTITY_HIGH_VALUE_REFRESH_SECS,
                identity::DEFAULT_HIGH_VALUE_REFRESH_SECS,
            )?),
            max_failures: parse_env(
                env_config::IDENTITY_MAX_FAILURES,
                identity::DEFAULT_MAX_FAILURES,
            )?,
            failure_cooldown: Duration::seconds(parse_env(
                env_config::IDENTITY_FAILURE_COOLDOWN_SECS,
                identity::DEFAULT_FAILURE_COOLDOWN_SECS,
            )?),
        };

        if config.high_value_refresh_window >= config.ttl {
            return Err(AppError::config(format!(
                "{} must be shorter than {}",
                env_config::IDENTITY_HIGH_VALUE_REFRESH_SECS,
                env_config::IDENTITY_TTL_SECS
            )));
        }

        Ok(config)
    }
}
