// ABOUTME: Result of a bounded cursor-paginated traversal and the bounds that shape it
// ABOUTME: Partial results are valid data; StopReason explains why the walk ended
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::constants::pagination::{DEFAULT_MAX_ITEMS, DEFAULT_MAX_PAGES};
use crate::errors::FetchErrorKind;

/// Why a traversal stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Upstream reported no further cursor
    Exhausted,
    /// `max_pages` reached
    MaxPages,
    /// `max_items` reached
    MaxItems,
    /// Items fell clearly below the caller's time window
    BoundaryReached,
    /// A fetch failed; accumulated items are still returned
    UpstreamError,
}

impl StopReason {
    /// Everything except natural exhaustion yields a partial result
    #[must_use]
    pub const fn is_partial(self) -> bool {
        !matches!(self, Self::Exhausted)
    }
}

/// Limits applied to one traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionBounds {
    /// Maximum pages to request
    pub max_pages: u32,
    /// Maximum items to return
    pub max_items: usize,
    /// Oldest timestamp the caller is interested in
    pub time_range_lower_bound: Option<DateTime<Utc>>,
}

impl Default for CollectionBounds {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_items: DEFAULT_MAX_ITEMS,
            time_range_lower_bound: None,
        }
    }
}

impl CollectionBounds {
    /// Bounds with explicit page and item limits
    #[must_use]
    pub const fn new(max_pages: u32, max_items: usize) -> Self {
        Self {
            max_pages,
            max_items,
            time_range_lower_bound: None,
        }
    }

    /// Stop once items are older than `lower_bound` (minus the configured grace)
    #[must_use]
    pub const fn since(mut self, lower_bound: DateTime<Utc>) -> Self {
        self.time_range_lower_bound = Some(lower_bound);
        self
    }
}

/// Redacted description of the fetch that ended a traversal early
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    /// Classification of the last attempt
    pub kind: FetchErrorKind,
    /// HTTP status, when a response arrived
    pub http_status: Option<u16>,
    /// Attempts spent on the failing page
    pub attempts: u32,
    /// Redacted diagnostic text
    pub diagnostic: Option<String>,
}

/// Items gathered by a traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResult<T> {
    /// Items in upstream order
    pub items: Vec<T>,
    /// Pages actually requested and consumed
    pub pages_fetched: u32,
    /// `true` whenever the stop was not natural exhaustion
    pub partial: bool,
    /// Why the traversal ended
    pub stop_reason: StopReason,
    /// Oldest item timestamp observed
    pub oldest_seen: Option<DateTime<Utc>>,
    /// Set when `stop_reason` is `UpstreamError`
    pub failure: Option<FetchFailure>,
}

impl<T> CollectionResult<T> {
    /// Build a result; `partial` follows from `stop_reason`
    #[must_use]
    pub fn new(
        items: Vec<T>,
        pages_fetched: u32,
        stop_reason: StopReason,
        oldest_seen: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            items,
            pages_fetched,
            partial: stop_reason.is_partial(),
            stop_reason,
            oldest_seen,
            failure: None,
        }
    }

    /// Attach the failure that ended the traversal
    #[must_use]
    pub fn with_failure(mut self, failure: FetchFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Number of items gathered
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was gathered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the traversal ended because the upstream rejected the credential.
    ///
    /// The gathered items are still valid; the caller decides whether to
    /// refresh and walk again.
    #[must_use]
    pub fn is_auth_rejected(&self) -> bool {
        self.failure
            .as_ref()
            .is_some_and(|failure| matches!(failure.kind, FetchErrorKind::AuthExpired))
    }

    /// Exact post-filter: keep items whose timestamp falls inside `range`.
    ///
    /// Upstream filters and boundary stopping are both approximate, so callers
    /// needing an exact window apply this after the traversal. Items without a
    /// timestamp are dropped.
    pub fn retain_within<F>(&mut self, range: &RangeInclusive<DateTime<Utc>>, timestamp_of: F)
    where
        F: Fn(&T) -> Option<DateTime<Utc>>,
    {
        self.items
            .retain(|item| timestamp_of(item).is_some_and(|ts| range.contains(&ts)));
    }
}
