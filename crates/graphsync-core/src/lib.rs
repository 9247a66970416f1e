// ABOUTME: Core types and constants for the graphsync external API access layer
// ABOUTME: Foundation crate with error taxonomy, credential/identity models and pagination types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Shared foundation for the graphsync access layer.
//!
//! This crate holds everything the fetch, token, pagination and identity
//! components agree on: the data model, the error taxonomy and the tunable
//! defaults. It performs no I/O.

/// Tunable defaults and environment variable names
pub mod constants;
/// Error taxonomy (fetch, token, collection, cache) and the `AppError` currency
pub mod errors;
/// Domain models: credentials, identities, collection results
pub mod models;
/// Opaque page cursors
pub mod pagination;

pub use errors::{
    AppError, AppResult, CollectError, ErrorCode, FetchErrorKind, ResolveError, TokenError,
};
pub use models::{
    CollectionBounds, CollectionResult, Credential, FetchFailure, FieldValue, ResolvedIdentity,
    StopReason,
};
pub use pagination::PageCursor;
