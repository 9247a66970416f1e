// ABOUTME: Google Business Profile presets: reviews and local posts collections, location lookup
// ABOUTME: Bearer tokens refreshed through the standard Google OAuth token endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::TokenPlacement;
use crate::identity::{FieldsParam, IdentityLookup};
use crate::oauth2_client::{OAuth2Config, RefreshRequestStyle};
use crate::pagination::{CollectionQuery, EnvelopeSpec};

/// Google OAuth token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// v4 API base (reviews, local posts)
pub const MY_BUSINESS_V4_BASE: &str = "https://mybusiness.googleapis.com/v4";
/// Business Information API base (locations)
pub const BUSINESS_INFORMATION_BASE: &str =
    "https://mybusinessbusinessinformation.googleapis.com/v1";
/// Largest page the reviews endpoint accepts
pub const MAX_REVIEWS_PAGE_SIZE: usize = 50;

fn v4_envelope(items_path: &str) -> EnvelopeSpec {
    EnvelopeSpec::with_cursor_field(items_path, "nextPageToken", "pageToken")
        .page_size_param("pageSize")
        .timestamp_field("updateTime")
}

fn location_endpoint(account_id: &str, location_id: &str, collection: &str) -> String {
    format!(
        "{MY_BUSINESS_V4_BASE}/accounts/{}/locations/{}/{collection}",
        urlencoding::encode(account_id),
        urlencoding::encode(location_id)
    )
}

/// Reviews of a location, most recently updated first
///
/// # Errors
///
/// Returns an error if the ids produce an invalid URL
pub fn reviews_query(account_id: &str, location_id: &str) -> Result<CollectionQuery, url::ParseError> {
    let endpoint = Url::parse(&location_endpoint(account_id, location_id, "reviews"))?;
    Ok(CollectionQuery::new(endpoint, v4_envelope("reviews"))
        .param("orderBy", "updateTime desc")
        .page_size(MAX_REVIEWS_PAGE_SIZE))
}

/// Local posts of a location
///
/// # Errors
///
/// Returns an error if the ids produce an invalid URL
pub fn local_posts_query(
    account_id: &str,
    location_id: &str,
) -> Result<CollectionQuery, url::ParseError> {
    let endpoint = Url::parse(&location_endpoint(account_id, location_id, "localPosts"))?;
    Ok(CollectionQuery::new(endpoint, v4_envelope("localPosts")))
}

/// Location profile lookup; the subject is the numeric location id
#[must_use]
pub fn location_lookup() -> IdentityLookup {
    IdentityLookup {
        url_template: format!("{BUSINESS_INFORMATION_BASE}/locations/{{subject_id}}"),
        fields: [
            "name",
            "title",
            "websiteUri",
            "phoneNumbers.primaryPhone",
            "storefrontAddress.locality",
            "metadata.mapsUri",
            "metadata.newReviewUri",
            "profile.description",
        ]
        .iter()
        .map(|field| (*field).to_owned())
        .collect(),
        fields_param: Some(FieldsParam {
            name: "readMask".to_owned(),
            template: "{fields}".to_owned(),
        }),
        response_root: None,
        high_value_field: None,
        token_placement: TokenPlacement::BearerHeader,
    }
}

/// Refresh configuration for Google OAuth credentials
///
/// # Errors
///
/// Returns an error if the token URL constant is invalid
pub fn refresh_config(
    client_id: &str,
    client_secret: &str,
) -> Result<OAuth2Config, url::ParseError> {
    Ok(OAuth2Config {
        client_id: client_id.to_owned(),
        client_secret: client_secret.to_owned(),
        token_url: Url::parse(GOOGLE_TOKEN_URL)?,
        style: RefreshRequestStyle::FormPost,
    })
}

/// Reviewer block of a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    /// Public display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Profile photo URL
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

/// Owner reply on a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReply {
    /// Reply text
    pub comment: String,
    /// Last update of the reply
    #[serde(default)]
    pub update_time: Option<String>,
}

/// Review as returned by the v4 API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessReview {
    /// Review id
    pub review_id: String,
    /// Resource name
    #[serde(default)]
    pub name: Option<String>,
    /// Reviewer
    #[serde(default)]
    pub reviewer: Option<Reviewer>,
    /// `ONE` .. `FIVE`
    #[serde(default)]
    pub star_rating: Option<String>,
    /// Review text
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation time (RFC 3339)
    #[serde(default)]
    pub create_time: Option<String>,
    /// Last update (RFC 3339)
    #[serde(default)]
    pub update_time: Option<String>,
    /// Owner reply
    #[serde(default)]
    pub review_reply: Option<ReviewReply>,
}

impl BusinessReview {
    /// Star rating as a number
    #[must_use]
    pub fn stars(&self) -> Option<u8> {
        match self.star_rating.as_deref()? {
            "ONE" => Some(1),
            "TWO" => Some(2),
            "THREE" => Some(3),
            "FOUR" => Some(4),
            "FIVE" => Some(5),
            _ => None,
        }
    }
}
