// ABOUTME: Scripted HttpTransport for deterministic fetcher, collector and cache tests
// ABOUTME: Replays queued steps in order and records every request with its send time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::VecDeque;
use std::future::pending;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use graphsync::http::{ApiRequest, HttpTransport, RawResponse, TransportError};
use serde_json::Value;
use tokio::time::{sleep, Instant};
use url::Url;

/// One scripted transport reaction
pub enum Step {
    /// Respond with a status and raw body
    Respond(u16, String),
    /// Fail without a response
    Fail(TransportError),
    /// Never answer (the fetcher's timeout must fire)
    Hang,
    /// Answer after a delay
    Delayed(Duration, u16, String),
}

impl Step {
    pub fn json(status: u16, body: &Value) -> Self {
        Self::Respond(status, body.to_string())
    }

    pub fn connect_refused() -> Self {
        Self::Fail(TransportError::Connect("connection refused".to_owned()))
    }
}

/// Request as seen by the transport
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
    pub at: Instant,
}

impl SeenRequest {
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Transport replaying a script; an exhausted script answers with a network error
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Gaps between consecutive request send times
    pub fn gaps(&self) -> Vec<Duration> {
        let seen = self.seen.lock().unwrap();
        seen.windows(2).map(|pair| pair[1].at - pair[0].at).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(SeenRequest {
            method: request.method.to_string(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            form: request.form.clone(),
            at: Instant::now(),
        });
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Respond(status, body)) => Ok(RawResponse::new(status, body)),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => {
                pending::<()>().await;
                Err(TransportError::Timeout)
            }
            Some(Step::Delayed(delay, status, body)) => {
                sleep(delay).await;
                Ok(RawResponse::new(status, body))
            }
            None => Err(TransportError::Request("script exhausted".to_owned())),
        }
    }
}
