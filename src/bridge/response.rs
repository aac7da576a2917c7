// ABOUTME: Translation of upstream call outcomes into MCP tool results
// ABOUTME: HTTP failures become isError results; transport failures become internal errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use reqwest::StatusCode;
use serde_json::Value;

use super::executor::{ExecutionOutcome, UpstreamResponse};
use crate::mcp::schema::{CallToolResult, Content};

/// Marker appended to a body cut at the size limit
pub const TRUNCATION_MARKER: &str = "\n[response truncated]";

/// Upstream failure that never produced a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    /// `transport` or `timeout`
    pub kind: &'static str,
    /// Server-side detail, never sent to callers
    pub detail: String,
}

fn looks_like_json(response: &UpstreamResponse) -> bool {
    response
        .content_type
        .as_deref()
        .is_some_and(|content_type| {
            let essence = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
}

/// Render an upstream body as text
///
/// Bodies are decoded lossily as UTF-8. Complete JSON bodies are
/// pretty-printed; anything else is passed through as-is.
#[must_use]
pub fn render_body(response: &UpstreamResponse) -> String {
    let text = String::from_utf8_lossy(&response.body);
    if !response.truncated {
        let parsed = serde_json::from_str::<Value>(&text).ok().filter(|_| {
            looks_like_json(response) || text.trim_start().starts_with(['{', '['])
        });
        if let Some(pretty) = parsed.and_then(|value| serde_json::to_string_pretty(&value).ok()) {
            return pretty;
        }
    }
    let mut rendered = text.into_owned();
    if response.truncated {
        rendered.push_str(TRUNCATION_MARKER);
    }
    rendered
}

fn status_line(status: u16) -> String {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason());
    match reason {
        Some(reason) => format!("HTTP {status} {reason}"),
        None => format!("HTTP {status}"),
    }
}

/// Translate an execution outcome into a tool result
///
/// # Errors
///
/// Returns [`UpstreamFailure`] for transport failures and timeouts, which the
/// dispatcher reports as a JSON-RPC internal error
pub fn translate_outcome(outcome: ExecutionOutcome) -> Result<CallToolResult, UpstreamFailure> {
    match outcome {
        ExecutionOutcome::Success(response) => Ok(CallToolResult {
            content: vec![Content::text(render_body(&response))],
            is_error: false,
        }),
        ExecutionOutcome::HttpError(response) => {
            let mut content = vec![Content::text(status_line(response.status))];
            if !response.body.is_empty() {
                content.push(Content::text(render_body(&response)));
            }
            Ok(CallToolResult {
                content,
                is_error: true,
            })
        }
        ExecutionOutcome::Transport(detail) => Err(UpstreamFailure {
            kind: "transport",
            detail,
        }),
        ExecutionOutcome::Timeout(limit) => Err(UpstreamFailure {
            kind: "timeout",
            detail: format!("No response within {} ms", limit.as_millis()),
        }),
    }
}
