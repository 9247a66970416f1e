// ABOUTME: Cursor pagination over upstream collections
// ABOUTME: Envelope layouts plus the bounded sequential collector
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Bounded traversal
pub mod collector;
/// Envelope layouts and timestamp parsing
pub mod envelope;

pub use collector::{CollectionQuery, PaginatedCollector};
pub use envelope::{cursor_from_url, parse_timestamp, value_at, EnvelopeSpec, Page};
pub use graphsync_core::pagination::PageCursor;
