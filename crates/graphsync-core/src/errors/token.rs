// ABOUTME: Credential-level errors raised by the token refresh coordinator
// ABOUTME: Terminal for the calling operation; the UI prompts re-authorization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

use super::{AppError, ErrorCode};

/// Errors from `get_valid_credential`
#[derive(Debug, Error)]
pub enum TokenError {
    /// Nothing stored for the subject
    #[error("no credential stored for subject {subject_id}")]
    NoCredential {
        /// Subject the caller asked for
        subject_id: String,
    },

    /// Refresh was required and the upstream refused it (or could not be reached)
    #[error("credential refresh failed for subject {subject_id}: {reason}")]
    RefreshFailed {
        /// Subject whose refresh failed
        subject_id: String,
        /// Redacted reason
        reason: String,
        /// `true` when the refresh token itself was rejected
        revoked: bool,
    },

    /// Credential is near expiry and there is no refresh token on file
    #[error("credential for subject {subject_id} needs refresh but has no refresh token")]
    RefreshTokenMissing {
        /// Subject whose credential cannot be refreshed
        subject_id: String,
    },

    /// Credential store failed
    #[error("credential store error: {0}")]
    Store(#[from] AppError),
}

impl TokenError {
    /// Whether the user must reconnect the account to recover
    #[must_use]
    pub const fn requires_reauthorization(&self) -> bool {
        match self {
            Self::NoCredential { .. } | Self::RefreshTokenMissing { .. } => true,
            Self::RefreshFailed { revoked, .. } => *revoked,
            Self::Store(_) => false,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> Self {
        let code = match &error {
            TokenError::Store(inner) => inner.code,
            TokenError::RefreshFailed { revoked: false, .. } => {
                ErrorCode::ExternalServiceUnavailable
            }
            _ => ErrorCode::ExternalAuthFailed,
        };
        Self::new(code, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reauthorization_mapping() {
        let missing = TokenError::NoCredential {
            subject_id: "ig-1".to_owned(),
        };
        assert!(missing.requires_reauthorization());

        let transient = TokenError::RefreshFailed {
            subject_id: "ig-1".to_owned(),
            reason: "upstream unavailable".to_owned(),
            revoked: false,
        };
        assert!(!transient.requires_reauthorization());
        assert_eq!(
            AppError::from(transient).code,
            ErrorCode::ExternalServiceUnavailable
        );
    }
}
