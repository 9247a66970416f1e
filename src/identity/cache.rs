// ABOUTME: Staleness-aware identity resolver with field-specific freshness and failure cooldown
// ABOUTME: Serves cached records when possible, falls back to stale data when the upstream fails
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::lookup::IdentityLookup;
use crate::config::IdentityCacheConfig;
use crate::errors::{FetchErrorKind, ResolveError};
use crate::http::BackoffFetcher;
use crate::models::{FieldValue, ResolvedIdentity};
use crate::observability::{CacheLookup, SharedObserver};
use crate::stores::IdentityStore;
use crate::tokens::TokenRefreshCoordinator;

/// Why a record must be refetched, in rule order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchReason {
    /// No record, or one that has never been fetched successfully
    Missing,
    /// The high-value field is absent
    HighValueMissing,
    /// The high-value field is older than its refresh window
    HighValueStale,
    /// The record is older than the general TTL
    Expired,
}

impl RefetchReason {
    /// Whether the failure cooldown is bypassed
    #[must_use]
    pub const fn is_forced(self) -> bool {
        matches!(self, Self::HighValueMissing | Self::HighValueStale)
    }
}

struct LiveFailure {
    kind: FetchErrorKind,
    reason: String,
}

/// Resolves identity records through a backing store and the upstream lookup
///
/// Concurrent resolves of the same key are not deduplicated; each may refetch
/// and the last write wins.
pub struct StaleAwareResolverCache {
    store: Arc<dyn IdentityStore>,
    tokens: Arc<TokenRefreshCoordinator>,
    fetcher: BackoffFetcher,
    lookup: IdentityLookup,
    config: IdentityCacheConfig,
    observer: SharedObserver,
}

impl StaleAwareResolverCache {
    /// Create a resolver
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        tokens: Arc<TokenRefreshCoordinator>,
        fetcher: BackoffFetcher,
        lookup: IdentityLookup,
        config: IdentityCacheConfig,
    ) -> Self {
        let observer = fetcher.observer();
        Self {
            store,
            tokens,
            fetcher,
            lookup,
            config,
            observer,
        }
    }

    /// Replace the observer
    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Decide whether `record` needs a refetch at `now`
    #[must_use]
    pub fn refetch_reason(
        &self,
        record: Option<&ResolvedIdentity>,
        now: DateTime<Utc>,
    ) -> Option<RefetchReason> {
        let Some((record, age)) = record.and_then(|r| r.age(now).map(|age| (r, age))) else {
            return Some(RefetchReason::Missing);
        };

        if let Some(field) = &self.lookup.high_value_field {
            if record.field(field).is_none() {
                return Some(RefetchReason::HighValueMissing);
            }
            // A value the upstream stopped sending keeps its original stamp.
            if record
                .field_age(field, now)
                .is_some_and(|field_age| field_age > self.config.high_value_refresh_window)
            {
                return Some(RefetchReason::HighValueStale);
            }
        }
        (age > self.config.ttl).then_some(RefetchReason::Expired)
    }

    fn cooling_down(&self, record: &ResolvedIdentity, now: DateTime<Utc>) -> bool {
        record.fail_count >= self.config.max_failures
            && record
                .last_failed_at
                .is_some_and(|failed_at| now - failed_at < self.config.failure_cooldown)
    }

    /// Resolve the identity of `subject_id` as seen by `owner_account_id`
    ///
    /// # Errors
    ///
    /// Returns `Unresolvable` when no usable record exists and the live lookup
    /// fails (or is cooling down), and `Store` when the store fails.
    pub async fn resolve(
        &self,
        owner_account_id: &str,
        subject_id: &str,
    ) -> Result<ResolvedIdentity, ResolveError> {
        let now = Utc::now();
        let mut existing = self.store.get(owner_account_id, subject_id).await?;

        let reason = match (self.refetch_reason(existing.as_ref(), now), existing) {
            (None, Some(record)) => {
                self.observer
                    .on_cache_lookup(owner_account_id, subject_id, CacheLookup::Hit);
                return Ok(record);
            }
            (reason, existing_record) => {
                existing = existing_record;
                reason.unwrap_or(RefetchReason::Missing)
            }
        };

        if let Some(record) = existing.as_ref() {
            if !reason.is_forced() && self.cooling_down(record, now) {
                self.observer
                    .on_cache_lookup(owner_account_id, subject_id, CacheLookup::CoolingDown);
                if record.has_been_fetched() {
                    return Ok(record.clone());
                }
                return Err(self.unresolvable(
                    owner_account_id,
                    subject_id,
                    FetchErrorKind::ServerError,
                    format!(
                        "lookup cooling down after {} consecutive failures",
                        record.fail_count
                    ),
                ));
            }
        }

        let lookup = if reason == RefetchReason::Missing {
            CacheLookup::Miss
        } else {
            CacheLookup::Stale
        };
        self.observer
            .on_cache_lookup(owner_account_id, subject_id, lookup);
        debug!(owner = owner_account_id, subject = subject_id, ?reason, "Refetching identity");

        let mut record =
            existing.unwrap_or_else(|| ResolvedIdentity::unfetched(subject_id.to_owned()));

        match self.fetch_live(owner_account_id, subject_id).await {
            Ok(fields) => {
                record.record_success(fields, Utc::now());
                self.store
                    .upsert(owner_account_id, subject_id, &record)
                    .await?;
                Ok(record)
            }
            Err(failure) => {
                record.record_failure(Utc::now());
                self.store
                    .upsert(owner_account_id, subject_id, &record)
                    .await?;
                if record.has_been_fetched() {
                    Ok(record)
                } else {
                    Err(self.unresolvable(
                        owner_account_id,
                        subject_id,
                        failure.kind,
                        failure.reason,
                    ))
                }
            }
        }
    }

    async fn fetch_live(
        &self,
        owner_account_id: &str,
        subject_id: &str,
    ) -> Result<BTreeMap<String, Option<FieldValue>>, LiveFailure> {
        let credential = self
            .tokens
            .get_valid_credential(owner_account_id)
            .await
            .map_err(|e| LiveFailure {
                kind: FetchErrorKind::AuthExpired,
                reason: e.to_string(),
            })?;

        let request = self
            .lookup
            .build_request(owner_account_id, subject_id, &credential.access_token)
            .map_err(|reason| LiveFailure {
                kind: FetchErrorKind::ClientError,
                reason,
            })?;

        let outcome = self.fetcher.fetch(&request).await;
        if !outcome.ok {
            return Err(LiveFailure {
                kind: outcome.classified_error,
                reason: outcome.describe(),
            });
        }

        self.lookup
            .extract_fields(outcome.body_or_null())
            .map_err(|reason| LiveFailure {
                kind: FetchErrorKind::MalformedBody,
                reason,
            })
    }

    fn unresolvable(
        &self,
        owner_account_id: &str,
        subject_id: &str,
        kind: FetchErrorKind,
        reason: String,
    ) -> ResolveError {
        debug!(
            owner = owner_account_id,
            subject = subject_id,
            lookup = %self.lookup.url_template,
            %kind,
            "Identity unresolvable"
        );
        ResolveError::Unresolvable {
            owner_account_id: owner_account_id.to_owned(),
            subject_id: subject_id.to_owned(),
            kind,
            reason,
        }
    }
}
