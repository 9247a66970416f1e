// ABOUTME: HTTP plumbing for upstream calls: transport seam, client builders and the retrying fetcher
// ABOUTME: Every upstream request in the access layer goes through BackoffFetcher
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Shared `reqwest` client builders
pub mod client;
/// Retrying, timeout-bounded fetch primitive
pub mod fetcher;
/// Transport trait and request/response types
pub mod transport;

pub use client::{client_from_config, oauth_client, shared_client};
pub use fetcher::{BackoffFetcher, FetchOptions, FetchOutcome};
pub use transport::{
    ApiRequest, HttpTransport, RawResponse, ReqwestTransport, TokenPlacement, TransportError,
};
