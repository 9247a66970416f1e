// ABOUTME: Main library entry point for the graphsync external API access layer
// ABOUTME: Resilient fetching, single-flight token refresh, bounded pagination and identity caching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # graphsync
//!
//! Access layer for social and local-business graph APIs (Instagram Graph,
//! Google Business Profile). It sits between product features and upstream
//! HTTP APIs and turns unreliable, rate-limited, token-authenticated
//! endpoints into predictable building blocks.
//!
//! ## Features
//!
//! - **Resilient fetching**: [`http::BackoffFetcher`] bounds every attempt by
//!   a timeout, retries transient failures with exponential backoff and
//!   classifies every outcome into a closed [`errors::FetchErrorKind`] set
//! - **Token lifecycle**: [`tokens::TokenRefreshCoordinator`] refreshes each
//!   subject's credential at most once at a time, persisting before returning
//! - **Bounded pagination**: [`pagination::PaginatedCollector`] walks cursor
//!   envelopes within page, item and time bounds and reports why it stopped
//! - **Identity caching**: [`identity::StaleAwareResolverCache`] serves cached
//!   profiles with field-specific freshness and falls back to stale data on
//!   upstream failure
//! - **Secret-safe diagnostics**: tokens never appear in logs, errors or
//!   outcomes ([`redaction`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use graphsync::config::AccessLayerConfig;
//! use graphsync::http::{BackoffFetcher, ReqwestTransport};
//! use graphsync::models::{CollectionBounds, Credential};
//! use graphsync::oauth2_client::OAuth2RefreshClient;
//! use graphsync::pagination::PaginatedCollector;
//! use graphsync::providers::{instagram, Provider};
//! use graphsync::stores::InMemoryCredentialStore;
//! use graphsync::tokens::TokenRefreshCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     graphsync::logging::init_from_env()?;
//!     let config = AccessLayerConfig::from_env()?;
//!
//!     let fetcher = BackoffFetcher::new(Arc::new(ReqwestTransport::default()), config.retry.clone());
//!     let refresher = OAuth2RefreshClient::new(
//!         Provider::Instagram.refresh_config("client-id", "client-secret")?,
//!         config.tokens.clone(),
//!         fetcher.clone(),
//!     );
//!     let store = InMemoryCredentialStore::with_credentials([Credential::new("17841400000", "EAAB...")]);
//!     let tokens = Arc::new(TokenRefreshCoordinator::new(
//!         Arc::new(store),
//!         Arc::new(refresher),
//!         config.tokens.clone(),
//!     ));
//!
//!     let collector = PaginatedCollector::new(tokens, fetcher, config.pagination.clone());
//!     let media = collector
//!         .collect::<instagram::InstagramMedia>(
//!             "17841400000",
//!             &instagram::media_query("17841400000")?,
//!             &CollectionBounds::new(10, 200),
//!         )
//!         .await?;
//!     println!("{} media items ({:?})", media.len(), media.stop_reason);
//!     Ok(())
//! }
//! ```

/// Environment-driven configuration
pub mod config;

/// HTTP transport seam and the retrying fetcher
pub mod http;

/// Staleness-aware identity resolution
pub mod identity;

/// Structured logging setup and access-layer log events
pub mod logging;

/// OAuth 2.0 refresh-token client
pub mod oauth2_client;

/// Observer hooks for attempts, refreshes and cache decisions
pub mod observability;

/// Cursor-paginated collection traversal
pub mod pagination;

/// Instagram Graph and Google Business Profile presets
pub mod providers;

/// Secret redaction for diagnostics
pub mod redaction;

/// Credential and identity persistence seams
pub mod stores;

/// Per-subject single-flight token refresh
pub mod tokens;

pub use graphsync_core::{constants, errors, models};
