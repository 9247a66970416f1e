// ABOUTME: Opaque upstream pagination cursor
// ABOUTME: Produced by one page's envelope and consumed once to request the next page
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Opaque cursor identifying where to resume an upstream collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a raw cursor; blank strings are treated as "no cursor"
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Get the raw cursor string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PageCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cursor_is_none() {
        assert!(PageCursor::new("").is_none());
        assert!(PageCursor::new("   ").is_none());
        assert_eq!(PageCursor::new("QVFIU").unwrap().as_str(), "QVFIU");
    }
}
