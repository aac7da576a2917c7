// ABOUTME: Outbound HTTP execution for bridge tool calls with a hard timeout
// ABOUTME: Classifies outcomes as success, HTTP error, transport failure or timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # HTTP Executor
//!
//! One attempt per call, no retries. The reqwest call runs in its own task:
//! if the inbound request is dropped while the upstream call is in flight,
//! the task still runs to completion and its result is simply discarded.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bridge_core::HttpMethod;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use tracing::{debug, warn};

use super::request::{OutboundBody, OutboundRequest};
use crate::errors::{AppError, AppResult};

/// Captured upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header, if any
    pub content_type: Option<String>,
    /// Body bytes, possibly truncated
    pub body: Vec<u8>,
    /// Whether the body was cut at the size limit
    pub truncated: bool,
}

/// Classified result of one outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// 2xx response
    Success(UpstreamResponse),
    /// Non-2xx response
    HttpError(UpstreamResponse),
    /// DNS, connection, TLS or body read failure
    Transport(String),
    /// The call exceeded its timeout
    Timeout(Duration),
}

impl ExecutionOutcome {
    /// Short outcome label for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::HttpError(_) => "http_error",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Performs outbound requests
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Execute `request`, giving up after `timeout`
    async fn execute(&self, request: OutboundRequest, timeout: Duration) -> ExecutionOutcome;
}

/// reqwest-backed executor
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
    max_body_bytes: usize,
}

impl ReqwestExecutor {
    /// Executor capturing at most `max_body_bytes` of each response body
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built
    pub fn new(max_body_bytes: usize) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("bridge-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_body_bytes,
        })
    }
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

async fn send(
    client: Client,
    request: OutboundRequest,
    timeout: Duration,
    max_body_bytes: usize,
) -> ExecutionOutcome {
    let mut builder = client
        .request(to_reqwest_method(request.method), request.full_url())
        .timeout(timeout);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder = match request.body {
        Some(OutboundBody::Json {
            content_type,
            value,
        }) => builder
            .header(CONTENT_TYPE, content_type)
            .body(value.to_string()),
        Some(OutboundBody::Form(pairs)) => builder.form(&pairs),
        None => builder,
    };

    let mut response = match builder.send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => return ExecutionOutcome::Timeout(timeout),
        Err(e) => return ExecutionOutcome::Transport(e.to_string()),
    };

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let mut body = Vec::new();
    let mut truncated = false;
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = max_body_bytes.saturating_sub(body.len());
                if chunk.len() > room {
                    body.extend_from_slice(&chunk[..room]);
                    truncated = true;
                    break;
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) if e.is_timeout() => return ExecutionOutcome::Timeout(timeout),
            Err(e) => return ExecutionOutcome::Transport(format!("Failed to read body: {e}")),
        }
    }

    let captured = UpstreamResponse {
        status: status.as_u16(),
        content_type,
        body,
        truncated,
    };
    if status.is_success() {
        ExecutionOutcome::Success(captured)
    } else {
        ExecutionOutcome::HttpError(captured)
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: OutboundRequest, timeout: Duration) -> ExecutionOutcome {
        let started = Instant::now();
        let method = request.method;
        let host = request.url.host_str().unwrap_or_default().to_owned();

        let call = tokio::spawn(send(
            self.client.clone(),
            request,
            timeout,
            self.max_body_bytes,
        ));
        let outcome = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                ExecutionOutcome::Transport(format!("Upstream task failed: {join_error}"))
            }
            Err(_) => ExecutionOutcome::Timeout(timeout),
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &outcome {
            ExecutionOutcome::Success(response) | ExecutionOutcome::HttpError(response) => debug!(
                %method,
                host = %host,
                status = response.status,
                elapsed_ms,
                truncated = response.truncated,
                "Upstream call completed"
            ),
            ExecutionOutcome::Transport(detail) => {
                warn!(%method, host = %host, elapsed_ms, error = %detail, "Upstream transport failure");
            }
            ExecutionOutcome::Timeout(limit) => warn!(
                %method,
                host = %host,
                timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                "Upstream call timed out"
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn get(url: &str) -> OutboundRequest {
        OutboundRequest::new(HttpMethod::Get, Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_classifies_success_and_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let executor = ReqwestExecutor::new(1024).unwrap();
        let outcome = executor
            .execute(get(&format!("{}/ok", server.uri())), Duration::from_secs(5))
            .await;
        let ExecutionOutcome::Success(response) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(response.body, b"fine");

        let outcome = executor
            .execute(get(&format!("{}/broken", server.uri())), Duration::from_secs(5))
            .await;
        assert!(matches!(outcome, ExecutionOutcome::HttpError(ref r) if r.status == 503));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let executor = ReqwestExecutor::new(1024).unwrap();
        let outcome = executor
            .execute(get(&server.uri()), Duration::from_millis(100))
            .await;
        assert_eq!(outcome.kind(), "timeout");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let executor = ReqwestExecutor::new(1024).unwrap();
        let outcome = executor
            .execute(get("http://127.0.0.1:9/unreachable"), Duration::from_secs(5))
            .await;
        assert_eq!(outcome.kind(), "transport");
    }

    #[tokio::test]
    async fn test_body_truncated_at_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(100)))
            .mount(&server)
            .await;

        let executor = ReqwestExecutor::new(10).unwrap();
        let outcome = executor.execute(get(&server.uri()), Duration::from_secs(5)).await;
        let ExecutionOutcome::Success(response) = outcome else {
            panic!("expected success");
        };
        assert_eq!(response.body.len(), 10);
        assert!(response.truncated);
    }
}
