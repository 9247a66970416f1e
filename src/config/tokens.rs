// ABOUTME: Credential refresh configuration
// ABOUTME: Expiry buffer and the markers that identify an already-consumed refresh token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Duration;

use super::parse_env;
use crate::constants::{env_config, tokens};
use crate::errors::AppResult;

/// Credential refresh policy
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Credentials expiring within this window are refreshed before being handed out
    pub expiry_buffer: Duration,
    /// Lower-cased fragments that mark a "refresh token already used" rejection
    pub already_used_markers: Vec<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            expiry_buffer: Duration::seconds(tokens::DEFAULT_EXPIRY_BUFFER_SECS),
            already_used_markers: tokens::ALREADY_USED_MARKERS
                .iter()
                .map(|marker| (*marker).to_owned())
                .collect(),
        }
    }
}

impl TokenConfig {
    /// Load token configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if the expiry buffer is not a valid integer
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            expiry_buffer: Duration::seconds(parse_env(
                env_config::TOKEN_EXPIRY_BUFFER_SECS,
                tokens::DEFAULT_EXPIRY_BUFFER_SECS,
            )?),
            ..Self::default()
        })
    }

    /// Whether an upstream error text reports a consumed refresh token
    #[must_use]
    pub fn is_already_used(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.already_used_markers
            .iter()
            .any(|marker| lower.contains(marker.as_str()))
    }
}
