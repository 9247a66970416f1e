// ABOUTME: Describes an upstream identity/profile detail endpoint
// ABOUTME: Builds the lookup request and extracts typed scalar fields from the response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;

use serde_json::Value;
use url::Url;

use crate::http::{ApiRequest, TokenPlacement};
use crate::models::FieldValue;
use crate::pagination::value_at;

/// Query parameter listing the requested fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldsParam {
    /// Parameter name (`fields`, `readMask`)
    pub name: String,
    /// Value template; `{fields}` becomes the comma-joined field list and
    /// `{subject_id}` the subject
    pub template: String,
}

impl Default for FieldsParam {
    fn default() -> Self {
        Self {
            name: "fields".to_owned(),
            template: "{fields}".to_owned(),
        }
    }
}

/// Upstream detail endpoint for one kind of identity
#[derive(Debug, Clone)]
pub struct IdentityLookup {
    /// URL with `{owner_account_id}` and `{subject_id}` placeholders
    pub url_template: String,
    /// Field paths to extract (dot-separated below the response root)
    pub fields: Vec<String>,
    /// How the field list is requested; `None` sends no field parameter
    pub fields_param: Option<FieldsParam>,
    /// Path of the object holding the fields (e.g. `business_discovery`)
    pub response_root: Option<String>,
    /// Field whose absence or age forces a refetch
    pub high_value_field: Option<String>,
    /// How the access token is attached
    pub token_placement: TokenPlacement,
}

impl IdentityLookup {
    /// Build the request for `(owner_account_id, subject_id)`
    ///
    /// # Errors
    ///
    /// Returns a description when the expanded template is not a valid URL
    pub fn build_request(
        &self,
        owner_account_id: &str,
        subject_id: &str,
        access_token: &str,
    ) -> Result<ApiRequest, String> {
        let raw = self
            .url_template
            .replace("{owner_account_id}", &urlencoding::encode(owner_account_id))
            .replace("{subject_id}", &urlencoding::encode(subject_id));
        let url = Url::parse(&raw).map_err(|e| format!("invalid lookup URL: {e}"))?;

        let mut request = ApiRequest::get(url);
        if let Some(param) = &self.fields_param {
            let value = param
                .template
                .replace("{fields}", &self.requested_fields())
                .replace("{subject_id}", subject_id);
            request = request.with_query(&param.name, &value);
        }
        Ok(request.with_token(access_token, &self.token_placement))
    }

    /// Top-level names of the requested fields, comma-joined and deduplicated
    fn requested_fields(&self) -> String {
        let mut names: Vec<&str> = Vec::new();
        for field in &self.fields {
            let top = field.split('.').next().unwrap_or(field);
            if !names.contains(&top) {
                names.push(top);
            }
        }
        names.join(",")
    }

    /// Extract configured fields from a response body
    ///
    /// Every configured field appears in the result; missing or non-scalar
    /// values are `None`.
    ///
    /// # Errors
    ///
    /// Returns a description when the response root is absent
    pub fn extract_fields(&self, body: &Value) -> Result<BTreeMap<String, Option<FieldValue>>, String> {
        let root_path = self.response_root.as_deref().unwrap_or("");
        let root = value_at(body, root_path)
            .filter(|root| root.is_object())
            .ok_or_else(|| format!("response has no object at '{root_path}'"))?;

        Ok(self
            .fields
            .iter()
            .map(|field| {
                let value = value_at(root, field).and_then(FieldValue::from_json);
                (field.clone(), value)
            })
            .collect())
    }
}
