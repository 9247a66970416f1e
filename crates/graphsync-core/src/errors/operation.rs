// ABOUTME: Errors raised by the paginated collector and the identity resolver cache
// ABOUTME: Partial collections are reported via StopReason, not through these types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

use super::{AppError, FetchErrorKind, TokenError};

/// Errors from `PaginatedCollector::collect`
#[derive(Debug, Error)]
pub enum CollectError {
    /// No usable credential for the subject
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<CollectError> for AppError {
    fn from(error: CollectError) -> Self {
        let CollectError::Token(inner) = error;
        inner.into()
    }
}

/// Errors from `StaleAwareResolverCache::resolve`
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No cached record to fall back on and the live lookup failed (or is cooling down)
    #[error("identity {subject_id} for owner {owner_account_id} is unresolvable: {reason}")]
    Unresolvable {
        /// Account whose credential scopes the lookup
        owner_account_id: String,
        /// External entity being resolved
        subject_id: String,
        /// Classification of the failed lookup
        kind: FetchErrorKind,
        /// Redacted reason
        reason: String,
    },

    /// Identity store failed
    #[error("identity store error: {0}")]
    Store(#[from] AppError),
}

impl From<ResolveError> for AppError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Store(inner) => inner,
            ResolveError::Unresolvable { kind, .. } => Self::new(kind.error_code(), error.to_string()),
        }
    }
}
