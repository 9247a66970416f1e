// ABOUTME: Describes where an upstream page keeps its items, cursor and item timestamps
// ABOUTME: Supports explicit cursor fields and full next-page URLs carrying a cursor parameter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use url::Url;

use crate::pagination::PageCursor;

/// Layout of a paginated response envelope
///
/// Paths are dot-separated object keys (`paging.cursors.after`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeSpec {
    /// Path to the items array
    pub items_path: String,
    /// Path to an explicit next-cursor field
    pub cursor_path: Option<String>,
    /// Path to a full next-page URL
    pub next_url_path: Option<String>,
    /// Query parameter carrying the cursor on requests (and inside next URLs)
    pub cursor_param: String,
    /// Query parameter carrying the page size, if the upstream accepts one
    pub page_size_param: Option<String>,
    /// Item field holding its timestamp
    pub timestamp_field: Option<String>,
}

/// One decoded page
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// Raw items in upstream order
    pub items: &'a [Value],
    /// Cursor for the following page; `None` when the upstream is exhausted
    pub next_cursor: Option<PageCursor>,
}

impl EnvelopeSpec {
    /// Envelope with an explicit cursor field only
    #[must_use]
    pub fn with_cursor_field(items_path: &str, cursor_path: &str, cursor_param: &str) -> Self {
        Self {
            items_path: items_path.to_owned(),
            cursor_path: Some(cursor_path.to_owned()),
            next_url_path: None,
            cursor_param: cursor_param.to_owned(),
            page_size_param: None,
            timestamp_field: None,
        }
    }

    /// Also look for a next-page URL at `path`
    #[must_use]
    pub fn next_url_at(mut self, path: &str) -> Self {
        self.next_url_path = Some(path.to_owned());
        self
    }

    /// Send the page size as `param`
    #[must_use]
    pub fn page_size_param(mut self, param: &str) -> Self {
        self.page_size_param = Some(param.to_owned());
        self
    }

    /// Read item timestamps from `field`
    #[must_use]
    pub fn timestamp_field(mut self, field: &str) -> Self {
        self.timestamp_field = Some(field.to_owned());
        self
    }

    /// Decode a page body
    ///
    /// A missing items field is an empty page (some upstreams omit the array
    /// rather than sending `[]`).
    ///
    /// # Errors
    ///
    /// Returns a description when the items field exists but is not an array
    pub fn parse_page<'a>(&self, body: &'a Value) -> Result<Page<'a>, String> {
        let items = match value_at(body, &self.items_path) {
            None | Some(Value::Null) => &[][..],
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                return Err(format!(
                    "expected an array at '{}', found {}",
                    self.items_path,
                    json_type(other)
                ))
            }
        };
        Ok(Page {
            items,
            next_cursor: self.next_cursor(body),
        })
    }

    /// Cursor for the next page, preferring the explicit field over the next URL
    ///
    /// When a next-URL path is configured its absence marks the last page, even
    /// if the explicit cursor field is still populated (Graph API keeps
    /// `cursors.after` on the final page).
    #[must_use]
    pub fn next_cursor(&self, body: &Value) -> Option<PageCursor> {
        let next_url = match self.next_url_path.as_deref() {
            Some(path) => Some(value_at(body, path).and_then(Value::as_str)?),
            None => None,
        };
        let explicit = self
            .cursor_path
            .as_deref()
            .and_then(|path| value_at(body, path))
            .and_then(Value::as_str)
            .and_then(PageCursor::new);
        if explicit.is_some() {
            return explicit;
        }
        cursor_from_url(next_url?, &self.cursor_param)
    }

    /// Timestamp of a raw item
    #[must_use]
    pub fn item_timestamp(&self, item: &Value) -> Option<DateTime<Utc>> {
        self.timestamp_field
            .as_deref()
            .and_then(|field| value_at(item, field))
            .and_then(parse_timestamp)
    }
}

/// Value at a dot-separated path
#[must_use]
pub fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Extract `param` from a next-page URL
#[must_use]
pub fn cursor_from_url(next_url: &str, param: &str) -> Option<PageCursor> {
    let url = Url::parse(next_url).ok()?;
    url.query_pairs()
        .find(|(name, _)| name == param)
        .and_then(|(_, value)| PageCursor::new(value.into_owned()))
}

/// Parse an RFC 3339 string (offset colon optional) or Unix epoch seconds
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0)),
        Value::String(text) => parse_timestamp_str(text.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(seconds) = text.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
