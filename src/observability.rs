// ABOUTME: Injected observer hooks for attempts, retries, cache lookups and token refreshes
// ABOUTME: Synchronous callbacks only; the default implementation emits tracing events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Cross-cutting observability for the access layer.
//!
//! Components call an [`AccessObserver`] at fixed hook points instead of
//! embedding diagnostics in their control flow. Callbacks run inline on the
//! caller's task, so implementations must be cheap and must not block or
//! perform network I/O. Buffer into a channel if you need to ship events
//! elsewhere.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::FetchErrorKind;
use crate::logging::AccessLogger;

/// One attempt is about to be sent
#[derive(Debug, Clone)]
pub struct AttemptStart<'a> {
    /// Zero-based attempt index
    pub attempt_index: u32,
    /// Attempts allowed for this call
    pub max_attempts: u32,
    /// HTTP method
    pub method: &'a str,
    /// Redacted URL
    pub url: &'a str,
}

/// One attempt finished
#[derive(Debug, Clone)]
pub struct AttemptResult<'a> {
    /// Zero-based attempt index
    pub attempt_index: u32,
    /// Redacted URL
    pub url: &'a str,
    /// HTTP status, if a response arrived
    pub http_status: Option<u16>,
    /// Classification
    pub kind: FetchErrorKind,
    /// Whether the fetcher may retry
    pub retryable: bool,
    /// Wall time the attempt took
    pub elapsed: Duration,
}

/// Outcome of an identity cache lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    /// Fresh record served without upstream traffic
    Hit,
    /// Record needs revalidation; upstream will be called
    Stale,
    /// No usable record; upstream will be called
    Miss,
    /// Failure cooldown active; stale record (or nothing) served without upstream traffic
    CoolingDown,
}

impl CacheLookup {
    /// Stable lower-case name for logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Stale => "stale",
            Self::Miss => "miss",
            Self::CoolingDown => "cooling_down",
        }
    }
}

/// Observer for access layer hook points
pub trait AccessObserver: Send + Sync {
    /// Before an attempt is sent
    fn on_attempt_start(&self, _event: &AttemptStart<'_>) {}

    /// After an attempt completed or timed out
    fn on_attempt_result(&self, _event: &AttemptResult<'_>) {}

    /// A retry has been scheduled after `delay`
    fn on_retry_scheduled(&self, _attempt_index: u32, _delay: Duration) {}

    /// Identity cache decision for `(owner, subject)`
    fn on_cache_lookup(&self, _owner_account_id: &str, _subject_id: &str, _lookup: CacheLookup) {}

    /// A credential refresh is starting
    fn on_refresh_start(&self, _subject_id: &str) {}

    /// A credential refresh finished
    fn on_refresh_result(&self, _subject_id: &str, _success: bool) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AccessObserver for NoopObserver {}

/// Observer that emits structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AccessObserver for TracingObserver {
    fn on_attempt_start(&self, event: &AttemptStart<'_>) {
        debug!(
            attempt = event.attempt_index + 1,
            max_attempts = event.max_attempts,
            method = event.method,
            url = event.url,
            "Upstream attempt starting"
        );
    }

    fn on_attempt_result(&self, event: &AttemptResult<'_>) {
        let elapsed_ms = u64::try_from(event.elapsed.as_millis()).unwrap_or(u64::MAX);
        if event.kind.is_none() {
            debug!(
                attempt = event.attempt_index + 1,
                status = event.http_status,
                elapsed_ms,
                "Upstream attempt succeeded"
            );
        } else {
            warn!(
                attempt = event.attempt_index + 1,
                url = event.url,
                status = event.http_status,
                kind = %event.kind,
                retryable = event.retryable,
                elapsed_ms,
                "Upstream attempt failed"
            );
        }
    }

    fn on_retry_scheduled(&self, attempt_index: u32, delay: Duration) {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        info!(next_attempt = attempt_index + 2, delay_ms, "Retrying upstream call");
    }

    fn on_cache_lookup(&self, owner_account_id: &str, subject_id: &str, lookup: CacheLookup) {
        AccessLogger::log_identity_decision(owner_account_id, subject_id, lookup.as_str());
    }

    fn on_refresh_start(&self, subject_id: &str) {
        info!(subject = subject_id, "Refreshing credential");
    }

    fn on_refresh_result(&self, subject_id: &str, success: bool) {
        AccessLogger::log_refresh_event(subject_id, "refresh", success);
    }
}

/// Shared observer handle used by every component
pub type SharedObserver = Arc<dyn AccessObserver>;

/// Default observer handle
#[must_use]
pub fn default_observer() -> SharedObserver {
    Arc::new(TracingObserver)
}
