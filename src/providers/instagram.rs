// ABOUTME: Instagram Graph API presets: media/comment collections, business discovery lookup
// ABOUTME: Tokens travel as the access_token query parameter and refresh via ig_refresh_token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::TokenPlacement;
use crate::identity::{FieldsParam, IdentityLookup};
use crate::oauth2_client::{OAuth2Config, RefreshRequestStyle};
use crate::pagination::{CollectionQuery, EnvelopeSpec};

/// Graph API base, version included
pub const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";
/// Long-lived token refresh endpoint
pub const REFRESH_URL: &str = "https://graph.instagram.com/refresh_access_token";
/// Grant type for long-lived token refresh
pub const REFRESH_GRANT_TYPE: &str = "ig_refresh_token";
/// Fields requested for media items
pub const MEDIA_FIELDS: &str =
    "id,caption,media_type,media_url,permalink,thumbnail_url,timestamp,like_count,comments_count";
/// Fields requested for comments
pub const COMMENT_FIELDS: &str = "id,text,username,timestamp,like_count";

/// Envelope shared by Graph list endpoints
#[must_use]
pub fn graph_envelope() -> EnvelopeSpec {
    EnvelopeSpec::with_cursor_field("data", "paging.cursors.after", "after")
        .next_url_at("paging.next")
        .page_size_param("limit")
        .timestamp_field("timestamp")
}

/// Media of an Instagram business account, newest first
///
/// # Errors
///
/// Returns an error if the account id produces an invalid URL
pub fn media_query(ig_user_id: &str) -> Result<CollectionQuery, url::ParseError> {
    let endpoint = Url::parse(&format!(
        "{GRAPH_API_BASE}/{}/media",
        urlencoding::encode(ig_user_id)
    ))?;
    Ok(CollectionQuery::new(endpoint, graph_envelope())
        .param("fields", MEDIA_FIELDS)
        .token_placement(TokenPlacement::access_token_param()))
}

/// Comments on one media object
///
/// # Errors
///
/// Returns an error if the media id produces an invalid URL
pub fn comments_query(media_id: &str) -> Result<CollectionQuery, url::ParseError> {
    let endpoint = Url::parse(&format!(
        "{GRAPH_API_BASE}/{}/comments",
        urlencoding::encode(media_id)
    ))?;
    Ok(CollectionQuery::new(endpoint, graph_envelope())
        .param("fields", COMMENT_FIELDS)
        .token_placement(TokenPlacement::access_token_param()))
}

/// Profile of another business account via `business_discovery`
///
/// The owner is the connected account whose token is used; the subject is the
/// username being looked up. `profile_picture_url` is a CDN URL that expires,
/// so it is the high-value field.
#[must_use]
pub fn business_discovery_lookup() -> IdentityLookup {
    IdentityLookup {
        url_template: format!("{GRAPH_API_BASE}/{{owner_account_id}}"),
        fields: [
            "id",
            "username",
            "name",
            "biography",
            "website",
            "followers_count",
            "follows_count",
            "media_count",
            "profile_picture_url",
        ]
        .iter()
        .map(|field| (*field).to_owned())
        .collect(),
        fields_param: Some(FieldsParam {
            name: "fields".to_owned(),
            template: "business_discovery.username({subject_id}){{fields}}".to_owned(),
        }),
        response_root: Some("business_discovery".to_owned()),
        high_value_field: Some("profile_picture_url".to_owned()),
        token_placement: TokenPlacement::access_token_param(),
    }
}

/// Refresh configuration for long-lived Instagram tokens
///
/// # Errors
///
/// Returns an error if the refresh URL constant is invalid
pub fn refresh_config(
    client_id: &str,
    client_secret: &str,
) -> Result<OAuth2Config, url::ParseError> {
    Ok(OAuth2Config {
        client_id: client_id.to_owned(),
        client_secret: client_secret.to_owned(),
        token_url: Url::parse(REFRESH_URL)?,
        style: RefreshRequestStyle::QueryGet {
            grant_type: REFRESH_GRANT_TYPE.to_owned(),
        },
    })
}

/// Media item as returned by the Graph API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstagramMedia {
    /// Media id
    pub id: String,
    /// Caption text
    #[serde(default)]
    pub caption: Option<String>,
    /// IMAGE, VIDEO or `CAROUSEL_ALBUM`
    #[serde(default)]
    pub media_type: Option<String>,
    /// Media URL (expires)
    #[serde(default)]
    pub media_url: Option<String>,
    /// Public permalink
    #[serde(default)]
    pub permalink: Option<String>,
    /// Creation time, e.g. `2024-05-01T10:00:00+0000`
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Likes
    #[serde(default)]
    pub like_count: Option<u64>,
    /// Comments
    #[serde(default)]
    pub comments_count: Option<u64>,
}
