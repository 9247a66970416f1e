// ABOUTME: Pagination traversal defaults
// ABOUTME: Page size, page/item bounds and the boundary grace buffer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Duration;

use super::parse_env;
use crate::constants::{env_config, pagination};
use crate::errors::AppResult;
use crate::models::CollectionBounds;

/// Pagination defaults
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Items requested per page
    pub page_size: usize,
    /// Default page bound
    pub max_pages: u32,
    /// Default item bound
    pub max_items: usize,
    /// Slack below the lower time bound before a traversal stops
    pub boundary_grace: Duration,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: pagination::DEFAULT_PAGE_SIZE,
            max_pages: pagination::DEFAULT_MAX_PAGES,
            max_items: pagination::DEFAULT_MAX_ITEMS,
            boundary_grace: Duration::seconds(pagination::DEFAULT_BOUNDARY_GRACE_SECS),
        }
    }
}

impl PaginationConfig {
    /// Load pagination configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is not a valid integer
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            page_size: parse_env(env_config::PAGE_SIZE, pagination::DEFAULT_PAGE_SIZE)?,
            max_pages: parse_env(env_config::MAX_PAGES, pagination::DEFAULT_MAX_PAGES)?,
            max_items: parse_env(env_config::MAX_ITEMS, pagination::DEFAULT_MAX_ITEMS)?,
            boundary_grace: Duration::seconds(parse_env(
                env_config::BOUNDARY_GRACE_SECS,
                pagination::DEFAULT_BOUNDARY_GRACE_SECS,
            )?),
        })
    }

    /// Bounds derived from the configured defaults
    #[must_use]
    pub const fn default_bounds(&self) -> CollectionBounds {
        CollectionBounds::new(self.max_pages, self.max_items)
    }
}
