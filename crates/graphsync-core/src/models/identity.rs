// ABOUTME: Cached identity/profile record for an external entity with failure bookkeeping
// ABOUTME: Field values keep their JSON scalar type so round trips never coerce them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Scalar profile field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag (e.g. `is_verified`)
    Bool(bool),
    /// Numeric value kept in its original JSON representation
    Number(serde_json::Number),
    /// Text (names, URLs)
    Text(String),
}

impl FieldValue {
    /// Convert a JSON value; `null`, arrays and objects have no scalar form
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => Some(Self::Number(number.clone())),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Text content, if this is a text value
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bool(_) | Self::Number(_) => None,
        }
    }
}

/// Cached identity for `(owner_account_id, subject_id)`
///
/// `fail_count` resets to zero on every successful fetch and grows by exactly
/// one on every failed fetch. `fetched_at` only moves on success; a record
/// that has never been fetched successfully (`fetched_at == None`) exists
/// purely to carry failure bookkeeping. `field_fetched_at` tracks when the
/// upstream last delivered each non-null value, which can lag `fetched_at`
/// for fields the upstream omits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    /// External entity this record describes
    pub subject_id: String,
    /// Profile fields; `None` records a field the upstream omitted or nulled
    pub fields: BTreeMap<String, Option<FieldValue>>,
    /// Last successful fetch
    pub fetched_at: Option<DateTime<Utc>>,
    /// Consecutive failed fetches
    pub fail_count: u32,
    /// Most recent failed fetch
    pub last_failed_at: Option<DateTime<Utc>>,
    /// When each field last arrived with a non-null value
    #[serde(default)]
    pub field_fetched_at: BTreeMap<String, DateTime<Utc>>,
}

impl ResolvedIdentity {
    /// Empty record that has never been fetched
    pub fn unfetched(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            fields: BTreeMap::new(),
            fetched_at: None,
            fail_count: 0,
            last_failed_at: None,
            field_fetched_at: BTreeMap::new(),
        }
    }

    /// Whether any fetch has ever succeeded for this record
    #[must_use]
    pub const fn has_been_fetched(&self) -> bool {
        self.fetched_at.is_some()
    }

    /// Non-null value of a field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    /// Age of the record relative to `now`; `None` if never fetched
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.fetched_at.map(|fetched_at| now - fetched_at)
    }

    /// Age of the value held for `name`, falling back to the record age
    #[must_use]
    pub fn field_age(&self, name: &str, now: DateTime<Utc>) -> Option<Duration> {
        self.field_fetched_at
            .get(name)
            .copied()
            .or(self.fetched_at)
            .map(|fetched_at| now - fetched_at)
    }

    /// Apply a successful fetch.
    ///
    /// Non-null incoming values overwrite and restamp the field. A null or
    /// missing value keeps a previously known value and its original stamp,
    /// since some upstreams omit fields intermittently; fields never seen
    /// before are recorded as `None`.
    pub fn record_success(
        &mut self,
        incoming: BTreeMap<String, Option<FieldValue>>,
        now: DateTime<Utc>,
    ) {
        for (name, value) in incoming {
            match value {
                Some(value) => {
                    self.field_fetched_at.insert(name.clone(), now);
                    self.fields.insert(name, Some(value));
                }
                None => {
                    self.fields.entry(name).or_insert(None);
                }
            }
        }
        self.fetched_at = Some(now);
        self.fail_count = 0;
        self.last_failed_at = None;
    }

    /// Apply a failed fetch
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.fail_count = self.fail_count.saturating_add(1);
        self.last_failed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_round_trip_is_exact() {
        let raw: Value = serde_json::from_str("12345678901234").unwrap();
        let value = FieldValue::from_json(&raw).unwrap();
        let encoded = serde_json::to_string(&value).unwrap();
        assert_eq!(encoded, "12345678901234");
        let decoded: FieldValue = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_success_keeps_known_value_when_upstream_omits_it() {
        let now = Utc::now();
        let mut record = ResolvedIdentity::unfetched("17841400000");
        record.record_success(
            BTreeMap::from([(
                "profile_picture_url".to_owned(),
                Some(FieldValue::Text("https://cdn/a.jpg".to_owned())),
            )]),
            now,
        );
        record.record_failure(now);
        let later = now + Duration::hours(30);
        record.record_success(
            BTreeMap::from([("profile_picture_url".to_owned(), None)]),
            later,
        );

        assert_eq!(
            record.field("profile_picture_url").and_then(FieldValue::as_str),
            Some("https://cdn/a.jpg")
        );
        assert_eq!(record.fail_count, 0);
        assert!(record.last_failed_at.is_none());
        assert_eq!(record.age(later), Some(Duration::zero()));
        assert_eq!(
            record.field_age("profile_picture_url", later),
            Some(Duration::hours(30))
        );
    }
}
