// ABOUTME: Shared HTTP client builders with connection pooling and timeout configuration
// ABOUTME: Provides the process-wide client plus config-driven and OAuth-tuned variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::config::HttpClientConfig;
use crate::constants::{service_names, timeouts};

static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

fn user_agent() -> String {
    format!("{}/{}", service_names::GRAPHSYNC, env!("CARGO_PKG_VERSION"))
}

/// Get or create the shared HTTP client with default settings
///
/// The client-level timeout is only an outer ceiling; `BackoffFetcher`
/// enforces its own per-attempt deadline.
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        create_client_with_timeout(
            timeouts::HTTP_CLIENT_TIMEOUT_SECS,
            timeouts::HTTP_CLIENT_CONNECT_TIMEOUT_SECS,
        )
    })
}

/// Create a new HTTP client with custom timeout settings
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .user_agent(user_agent())
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Create a client from loaded configuration
#[must_use]
pub fn client_from_config(config: &HttpClientConfig) -> Client {
    create_client_with_timeout(config.timeout_secs, config.connect_timeout_secs)
}

/// Client tuned for token refresh calls, which should be fast
#[must_use]
pub fn oauth_client() -> Client {
    create_client_with_timeout(15, 5)
}
