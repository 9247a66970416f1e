// ABOUTME: Bearer credential for one external subject with expiry bookkeeping
// ABOUTME: Value object replaced on refresh; Debug output never prints secrets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::redaction::PLACEHOLDER;

/// Access credential for an external subject (Instagram account, Business Profile location)
///
/// Handed out by value. A refresh produces a new `Credential`; one that has
/// been returned to a caller is never modified afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// External subject the credential belongs to
    pub subject_id: String,
    /// Bearer access token
    pub access_token: String,
    /// Refresh token, when the provider issued one
    pub refresh_token: Option<String>,
    /// Access token expiry; `None` means the provider reported no expiry
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create a credential without refresh token or expiry
    pub fn new(subject_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Attach a refresh token
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the expiry instant
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the access token is already past its expiry
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Whether the token expires within `buffer` of `now` (or already has)
    #[must_use]
    pub fn expires_within(&self, buffer: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now + buffer)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("subject_id", &self.subject_id)
            .field("access_token", &PLACEHOLDER)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| PLACEHOLDER),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_tokens() {
        let credential = Credential::new("ig-42", "EAAB-very-secret").with_refresh_token("rt-secret");
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("EAAB-very-secret"));
        assert!(!rendered.contains("rt-secret"));
        assert!(rendered.contains("ig-42"));
    }

    #[test]
    fn test_expiry_window() {
        let now = Utc::now();
        let credential = Credential::new("s", "t").with_expires_at(now + Duration::minutes(10));
        assert!(!credential.expires_within(Duration::minutes(5), now));
        assert!(credential.expires_within(Duration::minutes(15), now));
        assert!(!credential.is_expired(now));

        let no_expiry = Credential::new("s", "t");
        assert!(!no_expiry.expires_within(Duration::minutes(5), now));
    }
}
