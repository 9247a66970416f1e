// ABOUTME: Per-subject single-flight credential refresh with expiry buffer and reuse recovery
// ABOUTME: Hands out immutable Credential values and persists refreshed ones before returning them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::TokenConfig;
use crate::errors::TokenError;
use crate::logging::AccessLogger;
use crate::models::Credential;
use crate::oauth2_client::{RefreshError, TokenGrant, TokenRefresher};
use crate::observability::{default_observer, SharedObserver};
use crate::stores::CredentialStore;

/// Lifecycle of a subject's credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Outside the expiry buffer; handed out without network traffic
    Fresh,
    /// Inside the expiry buffer (or expired); the next request refreshes it
    NearExpiry,
    /// A refresh is in flight
    Refreshing,
    /// The stored refresh token was rejected; re-authorization required
    Invalid,
}

#[derive(Default)]
struct RefreshSlot {
    lock: Mutex<()>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag even if the refreshing future is dropped
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Hands out valid credentials, refreshing at most once per subject at a time
///
/// Refreshes for one subject are serialized through a per-subject async
/// mutex; waiters re-read the store after acquiring it, so they observe the
/// credential the first refresher persisted instead of refreshing again.
/// Unrelated subjects never contend. A slot lives only while some caller
/// holds it; rejected refresh tokens are remembered per subject until a new
/// credential is stored or refreshed.
pub struct TokenRefreshCoordinator {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    config: TokenConfig,
    slots: DashMap<String, Arc<RefreshSlot>>,
    rejected: DashMap<String, String>,
    observer: SharedObserver,
}

impl TokenRefreshCoordinator {
    /// Create a coordinator over `store` using `refresher` for upstream refreshes
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        config: TokenConfig,
    ) -> Self {
        Self {
            store,
            refresher,
            config,
            slots: DashMap::new(),
            rejected: DashMap::new(),
            observer: default_observer(),
        }
    }

    /// Replace the observer
    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Credential safe to use now, refreshed first if it is within the expiry buffer
    ///
    /// # Errors
    ///
    /// Returns `NoCredential` when nothing is stored, `RefreshTokenMissing` when a
    /// refresh is needed but impossible, `RefreshFailed` when the upstream refuses
    /// or cannot be reached, and `Store` when persistence fails.
    pub async fn get_valid_credential(&self, subject_id: &str) -> Result<Credential, TokenError> {
        let current = self.load(subject_id).await?;
        if !self.needs_refresh(&current) {
            return Ok(current);
        }
        self.refresh_single_flight(subject_id, false).await
    }

    /// Refresh regardless of expiry (still single-flight)
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_valid_credential`]
    pub async fn force_refresh(&self, subject_id: &str) -> Result<Credential, TokenError> {
        self.refresh_single_flight(subject_id, true).await
    }

    /// Store a newly authorized credential, clearing any `Invalid` state
    ///
    /// # Errors
    ///
    /// Returns `Store` if persistence fails
    pub async fn store_credential(&self, credential: &Credential) -> Result<(), TokenError> {
        self.store.put(&credential.subject_id, credential).await?;
        self.rejected.remove(&credential.subject_id);
        Ok(())
    }

    /// Current state of a subject's credential
    ///
    /// # Errors
    ///
    /// Returns `NoCredential` when nothing is stored, or `Store` on storage failure
    pub async fn state(&self, subject_id: &str) -> Result<TokenState, TokenError> {
        let current = self.load(subject_id).await?;
        if self.is_rejected(&current) {
            return Ok(TokenState::Invalid);
        }
        let in_flight = self
            .slots
            .get(subject_id)
            .is_some_and(|slot| slot.in_flight.load(Ordering::Acquire));
        if in_flight {
            return Ok(TokenState::Refreshing);
        }
        if self.needs_refresh(&current) {
            Ok(TokenState::NearExpiry)
        } else {
            Ok(TokenState::Fresh)
        }
    }

    async fn load(&self, subject_id: &str) -> Result<Credential, TokenError> {
        self.store
            .get(subject_id)
            .await?
            .ok_or_else(|| TokenError::NoCredential {
                subject_id: subject_id.to_owned(),
            })
    }

    fn needs_refresh(&self, credential: &Credential) -> bool {
        credential.expires_within(self.config.expiry_buffer, Utc::now())
    }

    fn is_rejected(&self, credential: &Credential) -> bool {
        let Some(rejected) = self.rejected.get(&credential.subject_id) else {
            return false;
        };
        credential.refresh_token.as_deref() == Some(rejected.value().as_str())
    }

    fn slot(&self, subject_id: &str) -> Arc<RefreshSlot> {
        // The map guard must not be held across an await.
        Arc::clone(
            self.slots
                .entry(subject_id.to_owned())
                .or_default()
                .value(),
        )
    }

    async fn refresh_single_flight(
        &self,
        subject_id: &str,
        force: bool,
    ) -> Result<Credential, TokenError> {
        let slot = self.slot(subject_id);
        let outcome = {
            let _serialized = slot.lock.lock().await;
            self.refresh_locked(subject_id, force, &slot).await
        };
        self.release_slot(subject_id, slot);
        outcome
    }

    /// Drop the subject's slot once nobody else holds it
    fn release_slot(&self, subject_id: &str, slot: Arc<RefreshSlot>) {
        drop(slot);
        self.slots
            .remove_if(subject_id, |_, slot| Arc::strong_count(slot) == 1);
    }

    async fn refresh_locked(
        &self,
        subject_id: &str,
        force: bool,
        slot: &RefreshSlot,
    ) -> Result<Credential, TokenError> {
        let current = self.load(subject_id).await?;
        if !force && !self.needs_refresh(&current) {
            debug!(subject = subject_id, "Credential already refreshed by another caller");
            return Ok(current);
        }

        if self.is_rejected(&current) {
            AccessLogger::log_refresh_event(subject_id, "rejected_token_reused", false);
            return Err(TokenError::RefreshFailed {
                subject_id: subject_id.to_owned(),
                reason: "stored refresh token was previously rejected; reconnect the account"
                    .to_owned(),
                revoked: true,
            });
        }

        let Some(refresh_token) = current.refresh_token.clone() else {
            return Err(TokenError::RefreshTokenMissing {
                subject_id: subject_id.to_owned(),
            });
        };

        self.observer.on_refresh_start(subject_id);
        let result = {
            let _in_flight = InFlight::enter(&slot.in_flight);
            self.refresher.refresh(subject_id, &refresh_token).await
        };

        let outcome = match result {
            Ok(grant) => self.persist_grant(&current, refresh_token, grant).await,
            Err(RefreshError::AlreadyUsed { detail }) => {
                self.recover_from_reuse(&current, detail).await
            }
            Err(RefreshError::Rejected { detail }) => {
                self.rejected.insert(subject_id.to_owned(), refresh_token);
                Err(TokenError::RefreshFailed {
                    subject_id: subject_id.to_owned(),
                    reason: detail,
                    revoked: true,
                })
            }
            Err(error @ RefreshError::Unavailable { .. }) => Err(TokenError::RefreshFailed {
                subject_id: subject_id.to_owned(),
                reason: error.to_string(),
                revoked: false,
            }),
        };

        self.observer.on_refresh_result(subject_id, outcome.is_ok());
        outcome
    }

    async fn persist_grant(
        &self,
        previous: &Credential,
        previous_refresh_token: String,
        grant: TokenGrant,
    ) -> Result<Credential, TokenError> {
        let now = Utc::now();
        let refreshed = Credential {
            subject_id: previous.subject_id.clone(),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.or(Some(previous_refresh_token)),
            expires_at: grant
                .expires_in
                .and_then(|lifetime| now.checked_add_signed(lifetime)),
        };

        self.store.put(&refreshed.subject_id, &refreshed).await?;
        self.rejected.remove(&refreshed.subject_id);
        Ok(refreshed)
    }

    /// A racing refresher consumed the token; use what it stored if that is usable
    async fn recover_from_reuse(
        &self,
        attempted: &Credential,
        detail: String,
    ) -> Result<Credential, TokenError> {
        let subject_id = attempted.subject_id.as_str();
        let stored = self.load(subject_id).await?;

        if stored != *attempted && !self.needs_refresh(&stored) {
            AccessLogger::log_refresh_event(subject_id, "recovered_after_reuse", true);
            return Ok(stored);
        }

        AccessLogger::log_refresh_event(subject_id, "reuse_unrecoverable", false);
        Err(TokenError::RefreshFailed {
            subject_id: subject_id.to_owned(),
            reason: detail,
            revoked: false,
        })
    }
}
