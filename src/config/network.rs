// ABOUTME: Network configuration for the shared HTTP client and the retry policy
// ABOUTME: Timeouts, attempt limits, exponential backoff base/cap and optional jitter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{env_var_or, parse_env};
use crate::constants::{env_config, retry, timeouts};
use crate::errors::{AppError, AppResult};

/// HTTP client timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Request timeout in seconds (an outer ceiling; attempts carry their own deadline)
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: timeouts::HTTP_CLIENT_TIMEOUT_SECS,
            connect_timeout_secs: timeouts::HTTP_CLIENT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl HttpClientConfig {
    /// Load HTTP client configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout variable is not a valid integer
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            timeout_secs: parse_env(
                env_config::HTTP_CLIENT_TIMEOUT_SECS,
                timeouts::HTTP_CLIENT_TIMEOUT_SECS,
            )?,
            connect_timeout_secs: parse_env(
                env_config::HTTP_CLIENT_CONNECT_TIMEOUT_SECS,
                timeouts::HTTP_CLIENT_CONNECT_TIMEOUT_SECS,
            )?,
        })
    }
}

/// Retry policy for `BackoffFetcher`
///
/// The delay before retry `n` (zero-based attempt index of the attempt that
/// just failed) is `base_delay * 2^n`, capped at `max_delay`. Jitter is off in
/// the baseline policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per logical call, first try included
    pub max_attempts: u32,
    /// Backoff base
    pub base_delay: Duration,
    /// Backoff cap
    pub max_delay: Duration,
    /// Deadline for each attempt
    pub per_attempt_timeout: Duration,
    /// Add up to `jitter_ratio * delay` of random extra delay
    pub jitter: bool,
    /// Jitter fraction, only used when `jitter` is set
    pub jitter_ratio: f64,
    /// Bytes kept from an unparseable body
    pub body_preview_limit: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry::DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(retry::DEFAULT_MAX_DELAY_MS),
            per_attempt_timeout: Duration::from_millis(retry::DEFAULT_PER_ATTEMPT_TIMEOUT_MS),
            jitter: false,
            jitter_ratio: retry::DEFAULT_JITTER_RATIO,
            body_preview_limit: retry::DEFAULT_BODY_PREVIEW_LIMIT,
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempts and base delay, other fields default
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// Override the per-attempt timeout
    #[must_use]
    pub const fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.per_attempt_timeout = timeout;
        self
    }

    /// Deterministic delay after the attempt at `attempt_index` failed
    #[must_use]
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let exponent = attempt_index.min(retry::MAX_BACKOFF_EXPONENT);
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(exponent))
            .min(self.max_delay)
    }

    /// Load retry policy from environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is malformed or `max_attempts` is zero
    pub fn from_env() -> AppResult<Self> {
        let max_attempts = parse_env(env_config::RETRY_MAX_ATTEMPTS, retry::DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(AppError::config(format!(
                "{} must be at least 1",
                env_config::RETRY_MAX_ATTEMPTS
            )));
        }

        Ok(Self {
            max_attempts,
            base_delay: Duration::from_millis(parse_env(
                env_config::RETRY_BASE_DELAY_MS,
                retry::DEFAULT_BASE_DELAY_MS,
            )?),
            max_delay: Duration::from_millis(parse_env(
                env_config::RETRY_MAX_DELAY_MS,
                retry::DEFAULT_MAX_DELAY_MS,
            )?),
            per_attempt_timeout: Duration::from_millis(parse_env(
                env_config::RETRY_ATTEMPT_TIMEOUT_MS,
                retry::DEFAULT_PER_ATTEMPT_TIMEOUT_MS,
            )?),
            jitter: matches!(
                env_var_or(env_config::RETRY_JITTER, "false")
                    .to_lowercase()
                    .as_str(),
                "1" | "true" | "yes"
            ),
            jitter_ratio: retry::DEFAULT_JITTER_RATIO,
            body_preview_limit: parse_env(
                env_config::BODY_PREVIEW_LIMIT,
                retry::DEFAULT_BODY_PREVIEW_LIMIT,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_from_base() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_is_capped() {
        let mut policy = RetryPolicy::new(5, Duration::from_secs(1));
        policy.max_delay = Duration::from_secs(5);
        assert_eq!(policy.delay_for(10), Duration::from_secs(5));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(5));
    }
}
