// ABOUTME: Upstream presets for the supported graph APIs
// ABOUTME: Envelope layouts, lookups and refresh endpoints per provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;
use crate::identity::IdentityLookup;
use crate::oauth2_client::OAuth2Config;

/// Google Business Profile presets
pub mod google_business;
/// Instagram Graph API presets
pub mod instagram;

/// Supported upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Instagram Graph API
    Instagram,
    /// Google Business Profile
    GoogleBusiness,
}

impl Provider {
    /// Identity lookup preset
    #[must_use]
    pub fn identity_lookup(self) -> IdentityLookup {
        match self {
            Self::Instagram => instagram::business_discovery_lookup(),
            Self::GoogleBusiness => google_business::location_lookup(),
        }
    }

    /// Refresh endpoint preset
    ///
    /// # Errors
    ///
    /// Returns an error if the preset URL fails to parse
    pub fn refresh_config(
        self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<OAuth2Config, AppError> {
        let config = match self {
            Self::Instagram => instagram::refresh_config(client_id, client_secret),
            Self::GoogleBusiness => google_business::refresh_config(client_id, client_secret),
        };
        config.map_err(|e| AppError::config(format!("Invalid {self} token URL: {e}")))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instagram => f.write_str("instagram"),
            Self::GoogleBusiness => f.write_str("google_business"),
        }
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_lowercase().as_str() {
            "instagram" | "ig" => Ok(Self::Instagram),
            "google_business" | "google" | "gbp" => Ok(Self::GoogleBusiness),
            other => Err(AppError::invalid_input(format!(
                "Unknown provider: {other}. Currently supported: instagram, google_business"
            ))),
        }
    }
}
