// ABOUTME: Identity/profile resolution for external entities
// ABOUTME: Upstream lookup descriptions and the staleness-aware resolver cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Staleness-aware resolver cache
pub mod cache;
/// Upstream lookup descriptions
pub mod lookup;

pub use cache::{RefetchReason, StaleAwareResolverCache};
pub use lookup::{FieldsParam, IdentityLookup};
