// ABOUTME: In-memory credential and identity stores backed by tokio RwLock maps
// ABOUTME: Identity records are kept serialized so reads exercise a real round trip
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, IdentityStore};
use crate::errors::{AppError, AppResult};
use crate::models::{Credential, ResolvedIdentity};

/// Process-local credential store
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: Arc<RwLock<HashMap<String, Credential>>>,
}

impl InMemoryCredentialStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with credentials keyed by their subject
    #[must_use]
    pub fn with_credentials(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let map = credentials
            .into_iter()
            .map(|credential| (credential.subject_id.clone(), credential))
            .collect();
        Self {
            credentials: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, subject_id: &str) -> AppResult<Option<Credential>> {
        Ok(self.credentials.read().await.get(subject_id).cloned())
    }

    async fn put(&self, subject_id: &str, credential: &Credential) -> AppResult<()> {
        self.credentials
            .write()
            .await
            .insert(subject_id.to_owned(), credential.clone());
        Ok(())
    }
}

type IdentityKey = (String, String);

/// Process-local identity store holding JSON-encoded records
#[derive(Clone, Default)]
pub struct InMemoryIdentityStore {
    records: Arc<RwLock<HashMap<IdentityKey, Vec<u8>>>>,
}

impl InMemoryIdentityStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get(
        &self,
        owner_account_id: &str,
        subject_id: &str,
    ) -> AppResult<Option<ResolvedIdentity>> {
        let key = (owner_account_id.to_owned(), subject_id.to_owned());
        let data = self.records.read().await.get(&key).cloned();
        data.map(|data| {
            serde_json::from_slice(&data).map_err(|e| {
                AppError::storage(format!("Corrupt identity record for {subject_id}: {e}"))
            })
        })
        .transpose()
    }

    async fn upsert(
        &self,
        owner_account_id: &str,
        subject_id: &str,
        identity: &ResolvedIdentity,
    ) -> AppResult<()> {
        let data = serde_json::to_vec(identity)?;
        self.records
            .write()
            .await
            .insert((owner_account_id.to_owned(), subject_id.to_owned()), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_identity_records_are_scoped_by_owner() {
        let store = InMemoryIdentityStore::new();
        let mut record = ResolvedIdentity::unfetched("natgeo");
        record.record_success(
            BTreeMap::from([(
                "followers_count".to_owned(),
                Some(FieldValue::Number(283_000_000.into())),
            )]),
            Utc::now(),
        );

        store.upsert("owner-a", "natgeo", &record).await.unwrap();

        assert_eq!(store.get("owner-a", "natgeo").await.unwrap(), Some(record));
        assert!(store.get("owner-b", "natgeo").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }
}
