// ABOUTME: Integration tests for OAuth2RefreshClient against a mock token endpoint
// ABOUTME: Covers Google form-post and Instagram query-style refreshes plus failure classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use graphsync::config::{RetryPolicy, TokenConfig};
use graphsync::errors::FetchErrorKind;
use graphsync::http::{BackoffFetcher, ReqwestTransport};
use graphsync::models::Credential;
use graphsync::oauth2_client::{
    OAuth2Config, OAuth2RefreshClient, RefreshError, RefreshRequestStyle, TokenRefresher,
};
use graphsync::stores::InMemoryCredentialStore;
use graphsync::tokens::TokenRefreshCoordinator;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> BackoffFetcher {
    helpers::init_test_logging();
    BackoffFetcher::new(
        Arc::new(ReqwestTransport::default()),
        RetryPolicy::new(3, StdDuration::from_millis(5)),
    )
}

fn google_client(server: &MockServer) -> OAuth2RefreshClient {
    let config = OAuth2Config {
        client_id: "client-123".to_owned(),
        client_secret: "shhh-client-secret".to_owned(),
        token_url: Url::parse(&format!("{}/token", server.uri())).unwrap(),
        style: RefreshRequestStyle::FormPost,
    };
    OAuth2RefreshClient::new(config, TokenConfig::default(), fetcher())
}

fn instagram_client(server: &MockServer) -> OAuth2RefreshClient {
    let config = OAuth2Config {
        client_id: "ig-app".to_owned(),
        client_secret: "ig-secret".to_owned(),
        token_url: Url::parse(&format!("{}/refresh_access_token", server.uri())).unwrap(),
        style: RefreshRequestStyle::QueryGet {
            grant_type: "ig_refresh_token".to_owned(),
        },
    };
    OAuth2RefreshClient::new(config, TokenConfig::default(), fetcher())
}

#[tokio::test]
async fn test_google_form_post_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Fgoogle-refresh"))
        .and(body_string_contains("client_id=client-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.new-access",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/business.manage",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = google_client(&server)
        .refresh("acct-1", "1//google-refresh")
        .await
        .unwrap();

    assert_eq!(grant.access_token, "ya29.new-access");
    assert_eq!(grant.refresh_token, None);
    assert_eq!(grant.expires_in, Some(Duration::seconds(3599)));
    assert_eq!(grant.token_type.as_deref(), Some("Bearer"));
}

#[tokio::test]
async fn test_instagram_query_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/refresh_access_token"))
        .and(query_param("grant_type", "ig_refresh_token"))
        .and(query_param("access_token", "IGQVJ-long-lived"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "IGQVJ-renewed",
            "token_type": "bearer",
            "expires_in": 5_183_944
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = instagram_client(&server)
        .refresh("17841400000", "IGQVJ-long-lived")
        .await
        .unwrap();

    assert_eq!(grant.access_token, "IGQVJ-renewed");
    assert_eq!(grant.expires_in, Some(Duration::seconds(5_183_944)));
}

#[tokio::test]
async fn test_invalid_grant_is_rejected_without_leaking_secrets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let error = google_client(&server)
        .refresh("acct-1", "1//google-refresh")
        .await
        .unwrap_err();

    match &error {
        RefreshError::Rejected { detail } => {
            assert!(detail.contains("invalid_grant"), "{detail}");
            assert!(detail.contains("expired or revoked"), "{detail}");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    let rendered = error.to_string();
    assert!(!rendered.contains("1//google-refresh"));
    assert!(!rendered.contains("shhh-client-secret"));
}

#[tokio::test]
async fn test_reused_refresh_token_is_classified_as_already_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token has already been used"
        })))
        .mount(&server)
        .await;

    let error = google_client(&server)
        .refresh("acct-1", "1//google-refresh")
        .await
        .unwrap_err();

    assert!(matches!(error, RefreshError::AlreadyUsed { .. }), "{error:?}");
}

#[tokio::test]
async fn test_graph_error_object_is_used_for_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/refresh_access_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Error validating access token: Session has expired",
                "type": "OAuthException",
                "code": 190
            }
        })))
        .mount(&server)
        .await;

    let error = instagram_client(&server)
        .refresh("17841400000", "IGQVJ-long-lived")
        .await
        .unwrap_err();

    match error {
        RefreshError::Rejected { detail } => assert!(detail.contains("Session has expired")),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors_make_endpoint_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let error = google_client(&server)
        .refresh("acct-1", "1//google-refresh")
        .await
        .unwrap_err();

    assert!(
        matches!(
            error,
            RefreshError::Unavailable {
                kind: FetchErrorKind::ServerError,
                ..
            }
        ),
        "{error:?}"
    );
}

#[tokio::test]
async fn test_success_without_access_token_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
        .mount(&server)
        .await;

    let error = google_client(&server)
        .refresh("acct-1", "1//google-refresh")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        RefreshError::Unavailable {
            kind: FetchErrorKind::MalformedBody,
            ..
        }
    ));
}

#[tokio::test]
async fn test_coordinator_refreshes_through_token_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.rotated",
            "refresh_token": "1//rotated-refresh",
            "expires_in": "3600"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::with_credentials([Credential::new(
        "acct-1",
        "ya29.stale",
    )
    .with_refresh_token("1//google-refresh")
    .with_expires_at(Utc::now() + Duration::seconds(30))]));
    let tokens = TokenRefreshCoordinator::new(
        store,
        Arc::new(google_client(&server)),
        TokenConfig::default(),
    );

    let credential = tokens.get_valid_credential("acct-1").await.unwrap();

    assert_eq!(credential.access_token, "ya29.rotated");
    assert_eq!(credential.refresh_token.as_deref(), Some("1//rotated-refresh"));
    assert!(credential.expires_at.unwrap() > Utc::now() + Duration::minutes(59));
}

#[tokio::test]
async fn test_oversized_expires_in_is_clamped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.forever",
            "expires_in": 1_000_000_000_000_000_000_i64
        })))
        .mount(&server)
        .await;

    let grant = google_client(&server)
        .refresh("acct-1", "1//google-refresh")
        .await
        .unwrap();
    assert_eq!(grant.expires_in, Some(Duration::days(10 * 365)));

    let store = Arc::new(InMemoryCredentialStore::with_credentials([Credential::new(
        "acct-1",
        "ya29.stale",
    )
    .with_refresh_token("1//google-refresh")
    .with_expires_at(Utc::now() - Duration::minutes(1))]));
    let tokens = TokenRefreshCoordinator::new(
        store,
        Arc::new(google_client(&server)),
        TokenConfig::default(),
    );

    let credential = tokens.get_valid_credential("acct-1").await.unwrap();

    assert_eq!(credential.access_token, "ya29.forever");
    assert!(credential.expires_at.unwrap() > Utc::now() + Duration::days(3_649));
}
