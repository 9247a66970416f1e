// ABOUTME: Secret redaction for every diagnostic the access layer surfaces
// ABOUTME: Scrubs query parameters, headers, JSON fields and token-shaped strings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Secret-safe diagnostics
//!
//! Bearer tokens travel in URLs (Instagram Graph `access_token=`) and headers
//! (Google `Authorization: Bearer`). Anything attached to a fetch outcome, a
//! log line or an error message passes through this module first.
//!
//! ```rust
//! use graphsync::redaction::{redact_url_str, RedactionConfig};
//!
//! let config = RedactionConfig::default();
//! let safe = redact_url_str("https://graph.facebook.com/me?access_token=EAAB123&fields=id", &config);
//! assert!(!safe.contains("EAAB123"));
//! assert!(safe.contains("fields=id"));
//! ```

use bitflags::bitflags;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::constants::redaction::{
    PLACEHOLDER, SENSITIVE_FIELDS, SENSITIVE_HEADERS, SENSITIVE_QUERY_PARAMS,
};

bitflags! {
    /// Which kinds of data to redact
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RedactionFeatures: u8 {
        /// Sensitive URL query parameters
        const QUERY_PARAMS = 0b0001;
        /// Sensitive HTTP headers
        const HEADERS = 0b0010;
        /// Sensitive JSON body fields
        const BODY_FIELDS = 0b0100;
        /// Bearer / JWT / provider token shapes in free text
        const TOKEN_PATTERNS = 0b1000;
        /// Everything
        const ALL = Self::QUERY_PARAMS.bits()
            | Self::HEADERS.bits()
            | Self::BODY_FIELDS.bits()
            | Self::TOKEN_PATTERNS.bits();
    }
}

/// Redaction settings
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    /// Which features are active
    pub features: RedactionFeatures,
    /// Replacement text
    pub placeholder: String,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            features: RedactionFeatures::ALL,
            placeholder: PLACEHOLDER.to_owned(),
        }
    }
}

fn is_sensitive_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_QUERY_PARAMS.contains(&lower.as_str())
}

/// Redact sensitive query parameter values from a parsed URL
#[must_use]
pub fn redact_url(url: &Url, config: &RedactionConfig) -> String {
    if !config.features.contains(RedactionFeatures::QUERY_PARAMS) || url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if is_sensitive_param(&name) {
                config.placeholder.clone()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Redact a URL given as text; unparseable input is scrubbed as free text
#[must_use]
pub fn redact_url_str(raw: &str, config: &RedactionConfig) -> String {
    Url::parse(raw).map_or_else(
        |_| redact_token_patterns(raw, config),
        |url| redact_url(&url, config),
    )
}

/// Redact sensitive HTTP header values
pub fn redact_headers<'a, I>(headers: I, config: &RedactionConfig) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let active = config.features.contains(RedactionFeatures::HEADERS);
    headers
        .into_iter()
        .map(|(name, value)| {
            let sensitive = active && SENSITIVE_HEADERS.contains(&name.to_lowercase().as_str());
            let value = if sensitive {
                config.placeholder.clone()
            } else {
                value.to_owned()
            };
            (name.to_owned(), value)
        })
        .collect()
}

fn field_patterns() -> &'static [(String, Regex)] {
    static PATTERNS: OnceLock<Vec<(String, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        SENSITIVE_FIELDS
            .iter()
            .filter_map(|field| {
                Regex::new(&format!(r#""{field}"\s*:\s*"[^"]*""#))
                    .ok()
                    .map(|re| ((*field).to_owned(), re))
            })
            .collect()
    })
}

/// Redact sensitive fields in JSON-like text
#[must_use]
pub fn redact_json_fields(text: &str, config: &RedactionConfig) -> String {
    if !config.features.contains(RedactionFeatures::BODY_FIELDS) {
        return text.to_owned();
    }

    let mut result = text.to_owned();
    for (field, re) in field_patterns() {
        result = re
            .replace_all(&result, format!(r#""{field}": "{}""#, config.placeholder))
            .into_owned();
    }
    result
}

fn token_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Authorization header values echoed in text
            (r"Bearer\s+[A-Za-z0-9\-._~+/]+=*", "Bearer "),
            // JWTs (header segment always starts with eyJ)
            (r"eyJ[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]+", ""),
            // Meta Graph user/page tokens
            (r"EAA[A-Za-z0-9]{16,}", ""),
            // Google OAuth access tokens
            (r"ya29\.[A-Za-z0-9\-_]+", ""),
            // token=... fragments in free text
            (r"(access_token|refresh_token|client_secret)=[^&\s]+", "$1="),
        ]
        .into_iter()
        .filter_map(|(pattern, prefix)| Regex::new(pattern).ok().map(|re| (re, prefix)))
        .collect()
    })
}

/// Redact token-shaped substrings from free text
#[must_use]
pub fn redact_token_patterns(text: &str, config: &RedactionConfig) -> String {
    if !config.features.contains(RedactionFeatures::TOKEN_PATTERNS) {
        return text.to_owned();
    }

    let mut result = text.to_owned();
    for (re, prefix) in token_patterns() {
        result = re
            .replace_all(&result, format!("{prefix}{}", config.placeholder))
            .into_owned();
    }
    result
}

/// Replace exact occurrences of known secrets (e.g. the token a request carried)
#[must_use]
pub fn redact_known_secrets<S: AsRef<str>>(
    text: &str,
    secrets: &[S],
    config: &RedactionConfig,
) -> String {
    secrets
        .iter()
        .map(AsRef::as_ref)
        .filter(|secret| !secret.is_empty())
        .fold(text.to_owned(), |acc, secret| {
            acc.replace(secret, &config.placeholder)
        })
}

/// Full free-text scrub: known secrets, JSON fields and token shapes
#[must_use]
pub fn redact_text<S: AsRef<str>>(text: &str, secrets: &[S], config: &RedactionConfig) -> String {
    let scrubbed = redact_known_secrets(text, secrets, config);
    let scrubbed = redact_json_fields(&scrubbed, config);
    redact_token_patterns(&scrubbed, config)
}

/// Lossy UTF-8 preview of a body, truncated to at most `limit` bytes on a char boundary
#[must_use]
pub fn body_preview(body: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= limit {
        return text.into_owned();
    }

    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &text[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url_keeps_non_secret_params() {
        let config = RedactionConfig::default();
        let url =
            Url::parse("https://graph.facebook.com/v19.0/me/media?fields=id,caption&access_token=EAAsecret&after=QVF")
                .unwrap();
        let redacted = redact_url(&url, &config);
        assert!(!redacted.contains("EAAsecret"));
        assert!(redacted.contains("fields=id%2Ccaption") || redacted.contains("fields=id,caption"));
        assert!(redacted.contains("after=QVF"));
        assert!(redacted.contains("graph.facebook.com"));
    }

    #[test]
    fn test_hostnames_survive_token_patterns() {
        let config = RedactionConfig::default();
        let text = "GET mybusiness.googleapis.com failed";
        assert_eq!(redact_token_patterns(text, &config), text);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let body = "héllo wörld".as_bytes();
        let preview = body_preview(body, 2);
        assert!(preview.starts_with('h'));
        assert!(preview.contains("bytes total"));
    }
}
