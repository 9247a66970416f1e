// ABOUTME: Bounded, strictly sequential cursor-pagination traversal over an upstream collection
// ABOUTME: Stops on exhaustion, page/item limits, time-boundary heuristic or upstream failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use super::envelope::EnvelopeSpec;
use crate::config::PaginationConfig;
use crate::errors::{CollectError, FetchErrorKind};
use crate::http::{ApiRequest, BackoffFetcher, FetchOptions, TokenPlacement};
use crate::logging::AccessLogger;
use crate::models::{CollectionBounds, CollectionResult, Credential, FetchFailure, StopReason};
use crate::pagination::PageCursor;
use crate::tokens::TokenRefreshCoordinator;

/// What to traverse
#[derive(Debug, Clone)]
pub struct CollectionQuery {
    /// Collection endpoint without cursor parameters
    pub endpoint: Url,
    /// Fixed query parameters sent with every page
    pub params: Vec<(String, String)>,
    /// Envelope layout
    pub envelope: EnvelopeSpec,
    /// How the access token is attached
    pub token_placement: TokenPlacement,
    /// Page size override
    pub page_size: Option<usize>,
    /// Ceiling for the whole traversal
    pub deadline: Option<Instant>,
}

impl CollectionQuery {
    /// Query over `endpoint` with `envelope`, bearer auth and no extra parameters
    #[must_use]
    pub const fn new(endpoint: Url, envelope: EnvelopeSpec) -> Self {
        Self {
            endpoint,
            params: Vec::new(),
            envelope,
            token_placement: TokenPlacement::BearerHeader,
            page_size: None,
            deadline: None,
        }
    }

    /// Add a fixed query parameter
    #[must_use]
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Set token placement
    #[must_use]
    pub fn token_placement(mut self, placement: TokenPlacement) -> Self {
        self.token_placement = placement;
        self
    }

    /// Set page size
    #[must_use]
    pub const fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Bound the traversal by a deadline
    #[must_use]
    pub const fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Walks cursor-paginated collections page by page
pub struct PaginatedCollector {
    tokens: Arc<TokenRefreshCoordinator>,
    fetcher: BackoffFetcher,
    config: PaginationConfig,
}

/// Mutable traversal state
struct Traversal<T> {
    items: Vec<T>,
    pages: u32,
    oldest_seen: Option<DateTime<Utc>>,
}

impl<T> Traversal<T> {
    fn finish(self, reason: StopReason) -> CollectionResult<T> {
        CollectionResult::new(self.items, self.pages, reason, self.oldest_seen)
    }

    fn fail(self, failure: FetchFailure) -> CollectionResult<T> {
        self.finish(StopReason::UpstreamError).with_failure(failure)
    }

    fn observe(&mut self, timestamp: Option<DateTime<Utc>>) {
        if let Some(ts) = timestamp {
            self.oldest_seen = Some(self.oldest_seen.map_or(ts, |oldest| oldest.min(ts)));
        }
    }
}

impl PaginatedCollector {
    /// Collector using `tokens` for credentials and `fetcher` for page requests
    #[must_use]
    pub const fn new(
        tokens: Arc<TokenRefreshCoordinator>,
        fetcher: BackoffFetcher,
        config: PaginationConfig,
    ) -> Self {
        Self {
            tokens,
            fetcher,
            config,
        }
    }

    /// Pagination defaults in use
    #[must_use]
    pub const fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Traverse the collection described by `query` for `subject_id`
    ///
    /// Partial results (limits, boundary, upstream failure) are returned as
    /// `Ok` with the matching `StopReason`. A 401/403 mid-traversal ends the
    /// walk with `UpstreamError` and an `AuthExpired` failure; the items already
    /// gathered stay in the result and the credential is not refreshed here
    /// (see [`CollectionResult::is_auth_rejected`]). Callers needing an exact
    /// time window apply [`CollectionResult::retain_within`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Token` when no valid credential is available before the first
    /// request.
    pub async fn collect<T: DeserializeOwned>(
        &self,
        subject_id: &str,
        query: &CollectionQuery,
        bounds: &CollectionBounds,
    ) -> Result<CollectionResult<T>, CollectError> {
        let mut traversal = Traversal {
            items: Vec::new(),
            pages: 0,
            oldest_seen: None,
        };
        if bounds.max_pages == 0 {
            return Ok(traversal.finish(StopReason::MaxPages));
        }
        if bounds.max_items == 0 {
            return Ok(traversal.finish(StopReason::MaxItems));
        }

        let credential = self.tokens.get_valid_credential(subject_id).await?;
        let cutoff = bounds
            .time_range_lower_bound
            .map(|lower| lower - self.config.boundary_grace);
        let options = FetchOptions {
            deadline: query.deadline,
            ..FetchOptions::default()
        };
        let mut cursor: Option<PageCursor> = None;

        let result = loop {
            if query.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break traversal.fail(FetchFailure {
                    kind: FetchErrorKind::Timeout,
                    http_status: None,
                    attempts: 0,
                    diagnostic: Some("traversal deadline reached".to_owned()),
                });
            }

            let request = self.page_request(query, &credential, cursor.as_ref());
            let outcome = self.fetcher.fetch_with(&request, &options).await;

            if outcome.is_auth_failure() {
                warn!(
                    subject = subject_id,
                    pages = traversal.pages,
                    status = outcome.http_status,
                    "Upstream rejected credential during traversal"
                );
            }
            if !outcome.ok {
                break traversal.fail(outcome.to_failure());
            }
            traversal.pages += 1;

            let body = outcome.body_or_null();
            let page = match query.envelope.parse_page(body) {
                Ok(page) => page,
                Err(reason) => {
                    break traversal.fail(malformed(&outcome.to_failure(), reason));
                }
            };

            let remaining = bounds.max_items.saturating_sub(traversal.items.len());
            let overflowed = page.items.len() > remaining;
            let mut decode_error = None;
            for (index, raw) in page.items.iter().take(remaining).enumerate() {
                match serde_json::from_value::<T>(raw.clone()) {
                    Ok(item) => {
                        traversal.observe(query.envelope.item_timestamp(raw));
                        traversal.items.push(item);
                    }
                    Err(e) => {
                        decode_error = Some(format!(
                            "item {index} on page {} could not be decoded: {e}",
                            traversal.pages
                        ));
                        break;
                    }
                }
            }
            if let Some(reason) = decode_error {
                break traversal.fail(malformed(&outcome.to_failure(), reason));
            }

            // Stop checks, in priority order.
            if overflowed {
                break traversal.finish(StopReason::MaxItems);
            }
            // Empty pages with a cursor are followed; max_pages bounds the walk.
            let next = match page.next_cursor {
                Some(next) if cursor.as_ref() != Some(&next) => next,
                _ => break traversal.finish(StopReason::Exhausted),
            };
            if let (Some(cutoff), Some(oldest)) = (cutoff, traversal.oldest_seen) {
                if oldest < cutoff {
                    debug!(subject = subject_id, %oldest, %cutoff, "Traversal passed time boundary");
                    break traversal.finish(StopReason::BoundaryReached);
                }
            }
            if traversal.items.len() >= bounds.max_items {
                break traversal.finish(StopReason::MaxItems);
            }
            if traversal.pages >= bounds.max_pages {
                break traversal.finish(StopReason::MaxPages);
            }
            cursor = Some(next);
        };

        AccessLogger::log_collection_summary(
            subject_id,
            query.endpoint.path(),
            result.pages_fetched,
            result.len(),
            &format!("{:?}", result.stop_reason),
        );
        Ok(result)
    }

    fn page_request(
        &self,
        query: &CollectionQuery,
        credential: &Credential,
        cursor: Option<&PageCursor>,
    ) -> ApiRequest {
        let mut request = ApiRequest::get(query.endpoint.clone());
        for (name, value) in &query.params {
            request = request.with_query(name, value);
        }
        if let Some(param) = &query.envelope.page_size_param {
            let page_size = query.page_size.unwrap_or(self.config.page_size);
            request = request.with_query(param, &page_size.to_string());
        }
        if let Some(cursor) = cursor {
            request = request.with_query(&query.envelope.cursor_param, cursor.as_str());
        }
        request.with_token(&credential.access_token, &query.token_placement)
    }
}

fn malformed(failure: &FetchFailure, reason: String) -> FetchFailure {
    FetchFailure {
        kind: FetchErrorKind::MalformedBody,
        diagnostic: Some(reason),
        ..failure.clone()
    }
}
