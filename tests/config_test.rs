// ABOUTME: Tests for environment-driven access layer configuration
// ABOUTME: Serialized because every case mutates process-wide GRAPHSYNC_* variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;
use graphsync::config::{
    AccessLayerConfig, IdentityCacheConfig, PaginationConfig, RetryPolicy, TokenConfig,
};
use graphsync::constants::env_config;
use graphsync::errors::ErrorCode;
use serial_test::serial;

const ALL_VARS: &[&str] = &[
    env_config::HTTP_CLIENT_TIMEOUT_SECS,
    env_config::HTTP_CLIENT_CONNECT_TIMEOUT_SECS,
    env_config::RETRY_MAX_ATTEMPTS,
    env_config::RETRY_BASE_DELAY_MS,
    env_config::RETRY_MAX_DELAY_MS,
    env_config::RETRY_ATTEMPT_TIMEOUT_MS,
    env_config::RETRY_JITTER,
    env_config::BODY_PREVIEW_LIMIT,
    env_config::TOKEN_EXPIRY_BUFFER_SECS,
    env_config::PAGE_SIZE,
    env_config::MAX_PAGES,
    env_config::MAX_ITEMS,
    env_config::BOUNDARY_GRACE_SECS,
    env_config::IDENTITY_TTL_SECS,
    env_config::IDENTITY_HIGH_VALUE_REFRESH_SECS,
    env_config::IDENTITY_MAX_FAILURES,
    env_config::IDENTITY_FAILURE_COOLDOWN_SECS,
];

fn clear_env() {
    helpers::init_test_logging();
    for var in ALL_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();

    let config = AccessLayerConfig::from_env().unwrap();

    assert_eq!(config.retry, RetryPolicy::default());
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.base_delay, StdDuration::from_millis(500));
    assert!(!config.retry.jitter);
    assert_eq!(config.tokens.expiry_buffer, Duration::minutes(5));
    assert_eq!(config.pagination.page_size, 25);
    assert_eq!(config.pagination.max_pages, 50);
    assert_eq!(config.pagination.max_items, 1_000);
    assert_eq!(config.pagination.boundary_grace, Duration::days(3));
    assert_eq!(config.identity.ttl, Duration::days(7));
    assert_eq!(config.identity.high_value_refresh_window, Duration::hours(24));
    assert_eq!(config.identity.max_failures, 3);
    assert_eq!(config.identity.failure_cooldown, Duration::minutes(15));
    assert_eq!(config.http.timeout_secs, 30);
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var(env_config::RETRY_MAX_ATTEMPTS, "5");
    env::set_var(env_config::RETRY_BASE_DELAY_MS, " 250 ");
    env::set_var(env_config::RETRY_JITTER, "TRUE");
    env::set_var(env_config::TOKEN_EXPIRY_BUFFER_SECS, "600");
    env::set_var(env_config::MAX_PAGES, "7");
    env::set_var(env_config::IDENTITY_FAILURE_COOLDOWN_SECS, "60");

    let config = AccessLayerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.base_delay, StdDuration::from_millis(250));
    assert!(config.retry.jitter);
    assert_eq!(config.tokens.expiry_buffer, Duration::minutes(10));
    assert_eq!(config.pagination.max_pages, 7);
    assert_eq!(config.pagination.default_bounds().max_pages, 7);
    assert_eq!(config.identity.failure_cooldown, Duration::minutes(1));
}

#[test]
#[serial]
fn test_malformed_value_is_config_error() {
    clear_env();
    env::set_var(env_config::MAX_ITEMS, "lots");

    let error = PaginationConfig::from_env().unwrap_err();
    clear_env();

    assert_eq!(error.code, ErrorCode::ConfigInvalid);
    assert!(error.message.contains(env_config::MAX_ITEMS), "{}", error.message);
    assert!(error.message.contains("lots"));
}

#[test]
#[serial]
fn test_zero_attempts_rejected() {
    clear_env();
    env::set_var(env_config::RETRY_MAX_ATTEMPTS, "0");

    let result = RetryPolicy::from_env();
    clear_env();

    assert_eq!(result.unwrap_err().code, ErrorCode::ConfigInvalid);
}

#[test]
#[serial]
fn test_high_value_window_must_be_shorter_than_ttl() {
    clear_env();
    env::set_var(env_config::IDENTITY_TTL_SECS, "3600");
    env::set_var(env_config::IDENTITY_HIGH_VALUE_REFRESH_SECS, "7200");

    let result = IdentityCacheConfig::from_env();
    clear_env();

    assert_eq!(result.unwrap_err().code, ErrorCode::ConfigInvalid);
}

#[test]
fn test_already_used_markers_match_case_insensitively() {
    let config = TokenConfig::default();

    assert!(config.is_already_used("Refresh token has ALREADY BEEN USED"));
    assert!(config.is_already_used("token reuse detected"));
    assert!(!config.is_already_used("Token has been expired or revoked."));
}
