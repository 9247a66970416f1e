// ABOUTME: Persistence seams for credentials and cached identities
// ABOUTME: The access layer never persists anything itself; callers inject these stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// In-memory store implementations
pub mod memory;

pub use memory::{InMemoryCredentialStore, InMemoryIdentityStore};

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{Credential, ResolvedIdentity};

/// Credential persistence keyed by subject
///
/// # Examples
///
/// ```rust,no_run
/// use graphsync::models::Credential;
/// use graphsync::stores::{CredentialStore, InMemoryCredentialStore};
/// # async fn example() -> Result<(), graphsync::errors::AppError> {
/// let store = InMemoryCredentialStore::new();
/// store.put("17841400000", &Credential::new("17841400000", "EAAB...")).await?;
/// assert!(store.get("17841400000").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credential for `subject_id`, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails
    async fn get(&self, subject_id: &str) -> AppResult<Option<Credential>>;

    /// Store or replace the credential for `subject_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails
    async fn put(&self, subject_id: &str, credential: &Credential) -> AppResult<()>;
}

/// Identity record persistence keyed by `(owner_account_id, subject_id)`
///
/// Each call touches one row; last write wins.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Stored record, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails
    async fn get(
        &self,
        owner_account_id: &str,
        subject_id: &str,
    ) -> AppResult<Option<ResolvedIdentity>>;

    /// Insert or replace a record
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails
    async fn upsert(
        &self,
        owner_account_id: &str,
        subject_id: &str,
        identity: &ResolvedIdentity,
    ) -> AppResult<()>;
}
