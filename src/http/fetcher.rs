// ABOUTME: Retrying, timeout-bounded HTTP fetch primitive shared by every upstream call
// ABOUTME: Classifies each attempt, backs off exponentially and never surfaces raw transport errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `BackoffFetcher` performs one logical HTTP call.
//!
//! Every attempt runs under its own deadline; when the deadline fires the
//! transport future is dropped, which aborts the in-flight request. 5xx, 429,
//! timeouts and network failures are retried after `base * 2^attempt_index`.
//! 401/403 and other 4xx responses are returned immediately. When attempts run
//! out the last HTTP response wins.
//!
//! A run with no HTTP response at all is classified by what the attempts hit:
//! `NetworkError` if any attempt failed at the transport level, `Timeout` if
//! every attempt ran into its deadline. Both carry `http_status: None` and are
//! retryable, so callers that only distinguish "no response" can match on
//! [`FetchOutcome::http_status`].

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tokio::time::{sleep, timeout, Instant};

use super::transport::{ApiRequest, HttpTransport, RawResponse, TransportError};
use crate::config::RetryPolicy;
use crate::errors::FetchErrorKind;
use crate::models::FetchFailure;
use crate::observability::{default_observer, AttemptResult, AttemptStart, SharedObserver};
use crate::redaction::body_preview;

/// Result of a logical fetch (the final attempt, or the last HTTP response seen)
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// `true` for a 2xx response with a parseable body
    pub ok: bool,
    /// HTTP status of the returned response, if any arrived
    pub http_status: Option<u16>,
    /// Parsed JSON body (also kept for error responses when they parse)
    pub body: Option<Value>,
    /// Classification
    pub classified_error: FetchErrorKind,
    /// Whether the classification is transient
    pub retryable: bool,
    /// Attempts performed
    pub attempts: u32,
    /// Redacted diagnostic (error body preview, transport message)
    pub diagnostic: Option<String>,
}

impl FetchOutcome {
    fn without_response(kind: FetchErrorKind, diagnostic: Option<String>) -> Self {
        Self {
            ok: false,
            http_status: None,
            body: None,
            classified_error: kind,
            retryable: kind.is_retryable(),
            attempts: 0,
            diagnostic,
        }
    }

    /// Upstream rejected the credential
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self.classified_error, FetchErrorKind::AuthExpired)
    }

    /// Body or `Value::Null`
    #[must_use]
    pub fn body_or_null(&self) -> &Value {
        self.body.as_ref().unwrap_or(&Value::Null)
    }

    /// Summary used by callers that stop on this outcome
    #[must_use]
    pub fn to_failure(&self) -> FetchFailure {
        FetchFailure {
            kind: self.classified_error,
            http_status: self.http_status,
            attempts: self.attempts,
            diagnostic: self.diagnostic.clone(),
        }
    }

    /// Short human-readable reason for logs and errors
    #[must_use]
    pub fn describe(&self) -> String {
        let status = self
            .http_status
            .map_or_else(|| "no response".to_owned(), |s| format!("HTTP {s}"));
        match &self.diagnostic {
            Some(diagnostic) => format!("{} ({status}): {diagnostic}", self.classified_error),
            None => format!("{} ({status})", self.classified_error),
        }
    }
}

/// Per-call overrides of the retry policy
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Attempt limit for this call
    pub max_attempts: Option<u32>,
    /// Deadline for each attempt
    pub per_attempt_timeout: Option<Duration>,
    /// Ceiling for the whole call, retries and delays included
    pub deadline: Option<Instant>,
}

impl FetchOptions {
    /// Options bounded by an overall deadline
    #[must_use]
    pub const fn with_deadline(deadline: Instant) -> Self {
        Self {
            max_attempts: None,
            per_attempt_timeout: None,
            deadline: Some(deadline),
        }
    }
}

/// Retrying fetch primitive
#[derive(Clone)]
pub struct BackoffFetcher {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    observer: SharedObserver,
}

impl BackoffFetcher {
    /// Fetcher over `transport` using `policy`
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            observer: default_observer(),
        }
    }

    /// Replace the observer
    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Active retry policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Observer shared with components built on this fetcher
    #[must_use]
    pub fn observer(&self) -> SharedObserver {
        Arc::clone(&self.observer)
    }

    /// Fetch with the default policy
    pub async fn fetch(&self, request: &ApiRequest) -> FetchOutcome {
        self.fetch_with(request, &FetchOptions::default()).await
    }

    /// Fetch with per-call overrides
    pub async fn fetch_with(&self, request: &ApiRequest, options: &FetchOptions) -> FetchOutcome {
        let max_attempts = options
            .max_attempts
            .unwrap_or(self.policy.max_attempts)
            .max(1);
        let per_attempt = options
            .per_attempt_timeout
            .unwrap_or(self.policy.per_attempt_timeout);
        let display_url = request.display_url();

        let mut attempts = 0_u32;
        let mut last_response: Option<FetchOutcome> = None;
        let mut last_failure: Option<FetchOutcome> = None;
        let mut saw_network_error = false;

        for attempt_index in 0..max_attempts {
            let attempt_timeout = match options.deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    per_attempt.min(remaining)
                }
                None => per_attempt,
            };

            self.observer.on_attempt_start(&AttemptStart {
                attempt_index,
                max_attempts,
                method: request.method.as_str(),
                url: &display_url,
            });

            let started = Instant::now();
            let outcome = match timeout(attempt_timeout, self.transport.send(request)).await {
                Ok(Ok(response)) => self.classify_response(request, &response),
                Ok(Err(TransportError::Timeout)) | Err(_) => FetchOutcome::without_response(
                    FetchErrorKind::Timeout,
                    Some(format!(
                        "attempt exceeded {} ms",
                        attempt_timeout.as_millis()
                    )),
                ),
                Ok(Err(error)) => {
                    saw_network_error = true;
                    FetchOutcome::without_response(
                        FetchErrorKind::NetworkError,
                        Some(request.redact(&error.to_string())),
                    )
                }
            };
            attempts = attempt_index + 1;

            self.observer.on_attempt_result(&AttemptResult {
                attempt_index,
                url: &display_url,
                http_status: outcome.http_status,
                kind: outcome.classified_error,
                retryable: outcome.retryable,
                elapsed: started.elapsed(),
            });

            if !outcome.retryable {
                return FetchOutcome { attempts, ..outcome };
            }

            if outcome.http_status.is_some() {
                last_response = Some(outcome);
            } else {
                last_failure = Some(outcome);
            }

            if attempts >= max_attempts {
                break;
            }

            let delay = self.delay_for(attempt_index);
            if let Some(deadline) = options.deadline {
                if Instant::now() + delay >= deadline {
                    break;
                }
            }
            self.observer.on_retry_scheduled(attempt_index, delay);
            sleep(delay).await;
        }

        if let Some(response) = last_response {
            return FetchOutcome {
                attempts,
                ..response
            };
        }

        let kind = if saw_network_error {
            FetchErrorKind::NetworkError
        } else {
            FetchErrorKind::Timeout
        };
        let diagnostic = last_failure
            .and_then(|failure| failure.diagnostic)
            .or_else(|| Some("deadline reached before an attempt could start".to_owned()));
        FetchOutcome {
            attempts,
            ..FetchOutcome::without_response(kind, diagnostic)
        }
    }

    fn delay_for(&self, attempt_index: u32) -> Duration {
        let delay = self.policy.delay_for(attempt_index);
        if !self.policy.jitter || self.policy.jitter_ratio <= 0.0 {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(0.0..=self.policy.jitter_ratio);
        (delay + delay.mul_f64(factor)).min(self.policy.max_delay.max(delay))
    }

    fn classify_response(&self, request: &ApiRequest, response: &RawResponse) -> FetchOutcome {
        let status = response.status;
        let kind = FetchErrorKind::from_status(status);
        let parsed = if response.body.is_empty() {
            Ok(None)
        } else {
            serde_json::from_slice::<Value>(&response.body).map(Some)
        };
        let preview = || {
            request.redact(&body_preview(
                &response.body,
                self.policy.body_preview_limit,
            ))
        };

        match (kind, parsed) {
            (FetchErrorKind::None, Ok(body)) => FetchOutcome {
                ok: true,
                http_status: Some(status),
                body,
                classified_error: FetchErrorKind::None,
                retryable: false,
                attempts: 0,
                diagnostic: None,
            },
            (FetchErrorKind::None, Err(error)) => FetchOutcome {
                ok: false,
                http_status: Some(status),
                body: None,
                classified_error: FetchErrorKind::MalformedBody,
                retryable: false,
                attempts: 0,
                diagnostic: Some(format!("invalid JSON ({error}): {}", preview())),
            },
            (kind, parsed) => FetchOutcome {
                ok: false,
                http_status: Some(status),
                body: parsed.ok().flatten(),
                classified_error: kind,
                retryable: kind.is_retryable(),
                attempts: 0,
                diagnostic: Some(preview()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;
    use url::Url;

    struct Scripted(Mutex<VecDeque<Result<RawResponse, TransportError>>>);

    #[async_trait]
    impl HttpTransport for Scripted {
        async fn send(&self, _request: &ApiRequest) -> Result<RawResponse, TransportError> {
            self.0
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Request("script exhausted".to_owned())))
        }
    }

    fn fetcher(script: Vec<Result<RawResponse, TransportError>>) -> BackoffFetcher {
        BackoffFetcher::new(
            Arc::new(Scripted(Mutex::new(script.into()))),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
    }

    fn request() -> ApiRequest {
        ApiRequest::get(Url::parse("https://api.example.com/items").unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_is_not_retried() {
        let fetcher = fetcher(vec![Ok(RawResponse::new(200, "<html>oops</html>"))]);
        let outcome = fetcher.fetch(&request()).await;

        assert_eq!(outcome.classified_error, FetchErrorKind::MalformedBody);
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.retryable);
        assert!(outcome.diagnostic.unwrap().contains("<html>oops</html>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_response_wins_over_network_errors() {
        let fetcher = fetcher(vec![
            Ok(RawResponse::new(503, "{}")),
            Err(TransportError::Connect("refused".to_owned())),
            Err(TransportError::Connect("refused".to_owned())),
        ]);
        let outcome = fetcher.fetch(&request()).await;

        assert_eq!(outcome.http_status, Some(503));
        assert_eq!(outcome.classified_error, FetchErrorKind::ServerError);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_keeps_parsed_body() {
        let fetcher = fetcher(vec![Ok(RawResponse::new(
            400,
            r#"{"error":{"message":"bad field"}}"#,
        ))]);
        let outcome = fetcher.fetch(&request()).await;

        assert_eq!(outcome.classified_error, FetchErrorKind::ClientError);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.body_or_null()["error"]["message"], "bad field");
    }
}
