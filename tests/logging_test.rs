// ABOUTME: Tests for logging configuration and environment variable handling
// ABOUTME: Serialized because RUST_LOG and friends are process-wide
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;

use graphsync::logging::{LogFormat, LoggingConfig};
use serial_test::serial;

const VARS: &[&str] = &[
    "RUST_LOG",
    "LOG_FORMAT",
    "ENVIRONMENT",
    "SERVICE_NAME",
    "LOG_INCLUDE_LOCATION",
    "LOG_INCLUDE_SPANS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_logging_config_from_env() {
    clear_env();
    env::set_var("RUST_LOG", "debug");
    env::set_var("LOG_FORMAT", "json");
    env::set_var("ENVIRONMENT", "production");
    env::set_var("SERVICE_NAME", "review-sync");

    let config = LoggingConfig::from_env();
    clear_env();

    assert_eq!(config.level, "debug");
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.environment, "production");
    assert_eq!(config.service_name, "review-sync");
    assert!(config.include_location, "production always logs locations");
    assert!(!config.include_spans);
}

#[test]
#[serial]
fn test_default_logging_config() {
    clear_env();

    let config = LoggingConfig::from_env();

    assert_eq!(config.level, "info");
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.environment, "development");
    assert_eq!(config.service_name, "graphsync");
    assert!(!config.include_location);
}

#[test]
#[serial]
fn test_filter_quiets_http_internals() {
    clear_env();
    let config = LoggingConfig {
        level: "debug".to_owned(),
        ..LoggingConfig::default()
    };

    let filter = config.env_filter().to_string();

    assert!(filter.contains("hyper=warn"), "{filter}");
    assert!(filter.contains("reqwest=warn"), "{filter}");
    assert!(filter.contains("graphsync=debug"), "{filter}");
}
