// ABOUTME: OAuth 2.0 client support for refreshing already-issued upstream tokens
// ABOUTME: Authorization-code exchange is owned by the surrounding product, not this crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # OAuth 2.0 Refresh Client
//!
//! The access layer only ever refreshes tokens that the product's own
//! authorization flow already issued. [`TokenRefresher`] is the seam the
//! [`crate::tokens::TokenRefreshCoordinator`] calls; [`OAuth2RefreshClient`]
//! is the HTTP implementation for Google-style form posts and Instagram
//! Graph-style long-lived token refreshes.

/// Refresh-token grant client
pub mod client;

pub use client::{
    OAuth2Config, OAuth2RefreshClient, RefreshError, RefreshRequestStyle, TokenGrant,
    TokenRefresher,
};
