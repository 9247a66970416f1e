// ABOUTME: Credential lifecycle management for upstream subjects
// ABOUTME: Exposes the single-flight refresh coordinator and its state machine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Single-flight refresh coordinator
pub mod coordinator;

pub use coordinator::{TokenRefreshCoordinator, TokenState};
