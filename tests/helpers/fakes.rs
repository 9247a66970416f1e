// ABOUTME: Fake refresher, recording observer and counting identity store for integration tests
// ABOUTME: Each fake counts its calls so tests can assert exactly how much upstream work happened
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use graphsync::errors::{AppError, AppResult, FetchErrorKind};
use graphsync::models::{Credential, ResolvedIdentity};
use graphsync::oauth2_client::{RefreshError, TokenGrant, TokenRefresher};
use graphsync::observability::{AccessObserver, AttemptResult, AttemptStart, CacheLookup};
use graphsync::stores::{CredentialStore, IdentityStore, InMemoryIdentityStore};
use tokio::time::sleep;

/// Grant valid for an hour
pub fn grant(access_token: &str, refresh_token: Option<&str>) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_owned(),
        refresh_token: refresh_token.map(str::to_owned),
        expires_in: Some(ChronoDuration::hours(1)),
        token_type: Some("Bearer".to_owned()),
    }
}

type Hook = Box<dyn Fn() -> Option<(Arc<dyn CredentialStore>, Credential)> + Send + Sync>;

/// Refresher with a scripted result queue; an empty queue yields `access-<n>` grants
pub struct FakeRefresher {
    calls: AtomicU32,
    delay: Duration,
    script: Mutex<VecDeque<Result<TokenGrant, RefreshError>>>,
    seen_tokens: Mutex<Vec<String>>,
    before_answer: Option<Hook>,
}

impl Default for FakeRefresher {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRefresher {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            delay: Duration::ZERO,
            script: Mutex::new(VecDeque::new()),
            seen_tokens: Mutex::new(Vec::new()),
            before_answer: None,
        }
    }

    /// Every refresh takes `delay` before answering
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_results(self, results: Vec<Result<TokenGrant, RefreshError>>) -> Self {
        *self.script.lock().unwrap() = results.into();
        self
    }

    /// Store `credential` (as another process would) right before answering
    #[must_use]
    pub fn storing_before_answer(
        mut self,
        store: Arc<dyn CredentialStore>,
        credential: Credential,
    ) -> Self {
        self.before_answer = Some(Box::new(move || {
            Some((Arc::clone(&store), credential.clone()))
        }));
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for FakeRefresher {
    async fn refresh(
        &self,
        _subject_id: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, RefreshError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_tokens
            .lock()
            .unwrap()
            .push(refresh_token.to_owned());
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if let Some((store, credential)) = self.before_answer.as_ref().and_then(|hook| hook()) {
            store.put(&credential.subject_id, &credential).await.unwrap();
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(grant(&format!("access-{call}"), None)))
    }
}

/// Events captured by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    AttemptStart(u32),
    AttemptResult {
        index: u32,
        status: Option<u16>,
        kind: FetchErrorKind,
    },
    RetryScheduled {
        index: u32,
        delay: Duration,
    },
    Cache(CacheLookup),
    RefreshStart,
    RefreshResult(bool),
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn retry_delays(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::RetryScheduled { delay, .. } => Some(delay),
                _ => None,
            })
            .collect()
    }

    pub fn cache_lookups(&self) -> Vec<CacheLookup> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Cache(lookup) => Some(lookup),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl AccessObserver for RecordingObserver {
    fn on_attempt_start(&self, event: &AttemptStart<'_>) {
        assert!(
            !event.url.contains("access_token=EAAB"),
            "observer received an unredacted URL: {}",
            event.url
        );
        self.push(Event::AttemptStart(event.attempt_index));
    }

    fn on_attempt_result(&self, event: &AttemptResult<'_>) {
        self.push(Event::AttemptResult {
            index: event.attempt_index,
            status: event.http_status,
            kind: event.kind,
        });
    }

    fn on_retry_scheduled(&self, attempt_index: u32, delay: Duration) {
        self.push(Event::RetryScheduled {
            index: attempt_index,
            delay,
        });
    }

    fn on_cache_lookup(&self, _owner_account_id: &str, _subject_id: &str, lookup: CacheLookup) {
        self.push(Event::Cache(lookup));
    }

    fn on_refresh_start(&self, _subject_id: &str) {
        self.push(Event::RefreshStart);
    }

    fn on_refresh_result(&self, _subject_id: &str, success: bool) {
        self.push(Event::RefreshResult(success));
    }
}

/// In-memory identity store that counts writes and can be told to fail
#[derive(Default)]
pub struct CountingIdentityStore {
    inner: InMemoryIdentityStore,
    upserts: AtomicU32,
    fail_writes: AtomicBool,
}

impl CountingIdentityStore {
    pub fn upserts(&self) -> u32 {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityStore for CountingIdentityStore {
    async fn get(
        &self,
        owner_account_id: &str,
        subject_id: &str,
    ) -> AppResult<Option<ResolvedIdentity>> {
        self.inner.get(owner_account_id, subject_id).await
    }

    async fn upsert(
        &self,
        owner_account_id: &str,
        subject_id: &str,
        identity: &ResolvedIdentity,
    ) -> AppResult<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::storage("identity store offline"));
        }
        self.inner.upsert(owner_account_id, subject_id, identity).await
    }
}
