// ABOUTME: Tests for secret redaction across URLs, headers, JSON bodies and free text
// ABOUTME: Covers Graph and Google token shapes plus feature toggles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use graphsync::redaction::{
    body_preview, redact_headers, redact_json_fields, redact_text, redact_token_patterns,
    redact_url_str, RedactionConfig, RedactionFeatures,
};

#[test]
fn test_graph_url_keeps_cursor_and_hides_token() {
    let config = RedactionConfig::default();
    let raw = "https://graph.facebook.com/v19.0/1784/media?limit=25&after=QVFIUmN1&access_token=EAABwzLixnjYBO1234";

    let redacted = redact_url_str(raw, &config);

    assert!(!redacted.contains("EAABwzLixnjYBO1234"));
    assert!(redacted.contains("access_token=%5BREDACTED%5D") || redacted.contains("access_token=[REDACTED]"));
    assert!(redacted.contains("after=QVFIUmN1"));
    assert!(redacted.contains("limit=25"));
}

#[test]
fn test_unparseable_url_falls_back_to_text_scrub() {
    let config = RedactionConfig::default();

    let redacted = redact_url_str("not a url ?access_token=abc123&x=1", &config);

    assert_eq!(redacted, "not a url ?access_token=[REDACTED]&x=1");
}

#[test]
fn test_sensitive_headers_case_insensitive() {
    let config = RedactionConfig::default();
    let headers = [
        ("Authorization", "Bearer ya29.a0Af"),
        ("X-Goog-Api-Key", "AIzaSy123"),
        ("Accept", "application/json"),
    ];

    let redacted = redact_headers(headers, &config);

    assert_eq!(redacted[0], ("Authorization".to_owned(), "[REDACTED]".to_owned()));
    assert_eq!(redacted[1].1, "[REDACTED]");
    assert_eq!(redacted[2].1, "application/json");
}

#[test]
fn test_token_response_fields_are_scrubbed() {
    let config = RedactionConfig::default();
    let body = r#"{"access_token": "ya29.new", "refresh_token":"1//rt", "expires_in": 3599, "scope": "business.manage"}"#;

    let redacted = redact_json_fields(body, &config);

    assert!(!redacted.contains("ya29.new"));
    assert!(!redacted.contains("1//rt"));
    assert!(redacted.contains(r#""expires_in": 3599"#));
    assert!(redacted.contains("business.manage"));
}

#[test]
fn test_token_shapes_in_free_text() {
    let config = RedactionConfig::default();

    let redacted = redact_token_patterns(
        "sent Authorization: Bearer abc.def-ghi with EAABwzLixnjYBOZCZB1234 and ya29.a0AfH6SM",
        &config,
    );

    assert_eq!(
        redacted,
        "sent Authorization: Bearer [REDACTED] with [REDACTED] and [REDACTED]"
    );
}

#[test]
fn test_known_secret_removed_even_without_token_shape() {
    let config = RedactionConfig::default();
    let secrets = ["opaque42"];

    let redacted = redact_text("upstream echoed opaque42 in its error", &secrets, &config);

    assert_eq!(redacted, "upstream echoed [REDACTED] in its error");
}

#[test]
fn test_disabled_features_leave_text_alone() {
    let config = RedactionConfig {
        features: RedactionFeatures::HEADERS,
        placeholder: "***".to_owned(),
    };
    let raw = "https://graph.facebook.com/me?access_token=EAABwzLixnjYBO1234";

    assert_eq!(redact_url_str(raw, &config), raw);
    assert_eq!(
        redact_headers([("Cookie", "sid=1")], &config)[0].1,
        "***"
    );
}

#[test]
fn test_preview_is_bounded() {
    let body = "x".repeat(2_000);

    let preview = body_preview(body.as_bytes(), 100);

    assert!(preview.starts_with(&"x".repeat(100)));
    assert!(preview.ends_with("(2000 bytes total)"));
    assert_eq!(body_preview(b"short", 100), "short");
}
