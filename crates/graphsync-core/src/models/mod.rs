// ABOUTME: Domain models shared by the fetch, token, pagination and identity components
// ABOUTME: Credential, ResolvedIdentity and CollectionResult value types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

mod collection;
mod credential;
mod identity;

pub use collection::{CollectionBounds, CollectionResult, FetchFailure, StopReason};
pub use credential::Credential;
pub use identity::{FieldValue, ResolvedIdentity};
