// ABOUTME: Default values and environment variable names for the access layer
// ABOUTME: Retry, token, pagination, identity cache and redaction tuning constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Service identity used in structured logs
pub mod service_names {
    /// Name reported by the logging layer
    pub const GRAPHSYNC: &str = "graphsync";
}

/// Retry and timeout defaults for `BackoffFetcher`
pub mod retry {
    /// Attempts per logical call (first try included)
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Base delay for `base * 2^attempt_index`
    pub const DEFAULT_BASE_DELAY_MS: u64 = 500;
    /// Upper bound on any single retry delay
    pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
    /// Hard deadline applied to each attempt
    pub const DEFAULT_PER_ATTEMPT_TIMEOUT_MS: u64 = 15_000;
    /// Bytes of an unparseable body kept for diagnostics
    pub const DEFAULT_BODY_PREVIEW_LIMIT: usize = 512;
    /// Fraction of the computed delay added as jitter when enabled
    pub const DEFAULT_JITTER_RATIO: f64 = 0.2;
    /// Exponent ceiling so `2^n` never overflows
    pub const MAX_BACKOFF_EXPONENT: u32 = 16;
}

/// HTTP client timeouts
pub mod timeouts {
    /// Shared client request timeout
    pub const HTTP_CLIENT_TIMEOUT_SECS: u64 = 30;
    /// Shared client connect timeout
    pub const HTTP_CLIENT_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Credential refresh defaults
pub mod tokens {
    /// Credentials expiring within this window are refreshed before use
    pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 5 * 60;
    /// Lower-cased fragments identifying "refresh token already used" responses
    pub const ALREADY_USED_MARKERS: &[&str] = &[
        "already used",
        "already been used",
        "already redeemed",
        "token reuse",
        "reused",
    ];
    /// OAuth `grant_type` for refresh requests
    pub const REFRESH_GRANT_TYPE: &str = "refresh_token";
    /// Longest token lifetime accepted from an upstream `expires_in` (ten years)
    pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;
}

/// Pagination traversal defaults
pub mod pagination {
    /// Items requested per page when the caller does not say
    pub const DEFAULT_PAGE_SIZE: usize = 25;
    /// Pages walked before stopping with `MaxPages`
    pub const DEFAULT_MAX_PAGES: u32 = 50;
    /// Items accumulated before stopping with `MaxItems`
    pub const DEFAULT_MAX_ITEMS: usize = 1_000;
    /// Slack below the lower time bound tolerated for out-of-order items (3 days)
    pub const DEFAULT_BOUNDARY_GRACE_SECS: i64 = 3 * 24 * 60 * 60;
}

/// Identity cache defaults
pub mod identity {
    /// General record TTL (7 days)
    pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 60 * 60;
    /// Revalidation window for the high-value field (24 hours)
    pub const DEFAULT_HIGH_VALUE_REFRESH_SECS: i64 = 24 * 60 * 60;
    /// Consecutive failures before the cooldown applies
    pub const DEFAULT_MAX_FAILURES: u32 = 3;
    /// Minimum wait after the last failure once `DEFAULT_MAX_FAILURES` is reached (15 minutes)
    pub const DEFAULT_FAILURE_COOLDOWN_SECS: i64 = 15 * 60;
}

/// Redaction placeholders and sensitive names
pub mod redaction {
    /// Replacement text for secrets
    pub const PLACEHOLDER: &str = "[REDACTED]";

    /// Query parameters whose values are secrets
    pub const SENSITIVE_QUERY_PARAMS: &[&str] = &[
        "access_token",
        "refresh_token",
        "client_secret",
        "code",
        "key",
        "token",
        "input_token",
        "appsecret_proof",
    ];

    /// Headers whose values are secrets
    pub const SENSITIVE_HEADERS: &[&str] = &[
        "authorization",
        "proxy-authorization",
        "cookie",
        "set-cookie",
        "x-api-key",
        "x-goog-api-key",
        "x-access-token",
    ];

    /// JSON fields whose values are secrets
    pub const SENSITIVE_FIELDS: &[&str] = &[
        "access_token",
        "accessToken",
        "refresh_token",
        "refreshToken",
        "client_secret",
        "id_token",
        "password",
        "secret",
    ];
}

/// Environment variable names
pub mod env_config {
    /// Shared client request timeout (seconds)
    pub const HTTP_CLIENT_TIMEOUT_SECS: &str = "GRAPHSYNC_HTTP_TIMEOUT_SECS";
    /// Shared client connect timeout (seconds)
    pub const HTTP_CLIENT_CONNECT_TIMEOUT_SECS: &str = "GRAPHSYNC_HTTP_CONNECT_TIMEOUT_SECS";
    /// Attempts per logical call
    pub const RETRY_MAX_ATTEMPTS: &str = "GRAPHSYNC_RETRY_MAX_ATTEMPTS";
    /// Backoff base delay (milliseconds)
    pub const RETRY_BASE_DELAY_MS: &str = "GRAPHSYNC_RETRY_BASE_DELAY_MS";
    /// Backoff delay cap (milliseconds)
    pub const RETRY_MAX_DELAY_MS: &str = "GRAPHSYNC_RETRY_MAX_DELAY_MS";
    /// Per-attempt timeout (milliseconds)
    pub const RETRY_ATTEMPT_TIMEOUT_MS: &str = "GRAPHSYNC_RETRY_ATTEMPT_TIMEOUT_MS";
    /// Enable additive jitter
    pub const RETRY_JITTER: &str = "GRAPHSYNC_RETRY_JITTER";
    /// Malformed body preview length (bytes)
    pub const BODY_PREVIEW_LIMIT: &str = "GRAPHSYNC_BODY_PREVIEW_LIMIT";
    /// Token expiry buffer (seconds)
    pub const TOKEN_EXPIRY_BUFFER_SECS: &str = "GRAPHSYNC_TOKEN_EXPIRY_BUFFER_SECS";
    /// Default page size
    pub const PAGE_SIZE: &str = "GRAPHSYNC_PAGE_SIZE";
    /// Default max pages
    pub const MAX_PAGES: &str = "GRAPHSYNC_MAX_PAGES";
    /// Default max items
    pub const MAX_ITEMS: &str = "GRAPHSYNC_MAX_ITEMS";
    /// Boundary grace (seconds)
    pub const BOUNDARY_GRACE_SECS: &str = "GRAPHSYNC_BOUNDARY_GRACE_SECS";
    /// Identity TTL (seconds)
    pub const IDENTITY_TTL_SECS: &str = "GRAPHSYNC_IDENTITY_TTL_SECS";
    /// High-value field refresh window (seconds)
    pub const IDENTITY_HIGH_VALUE_REFRESH_SECS: &str = "GRAPHSYNC_IDENTITY_HIGH_VALUE_REFRESH_SECS";
    /// Failures before cooldown
    pub const IDENTITY_MAX_FAILURES: &str = "GRAPHSYNC_IDENTITY_MAX_FAILURES";
    /// Failure cooldown (seconds)
    pub const IDENTITY_FAILURE_COOLDOWN_SECS: &str = "GRAPHSYNC_IDENTITY_FAILURE_COOLDOWN_SECS";
}
