// ABOUTME: MCP protocol schema types returned by the bridge dispatcher
// ABOUTME: Tools, prompts, resources, content blocks and initialize results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::protocol::{BRIDGE_SERVER_VERSION, MCP_PROTOCOL_VERSION};

/// MCP tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Tool name, unique within a bridge
    pub name: String,
    /// Human description
    pub description: String,
    /// JSON Schema of the `arguments` object
    pub input_schema: Value,
}

/// Argument accepted by a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name
    pub name: String,
    /// Human description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be given
    pub required: bool,
}

/// MCP prompt definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Prompt name
    pub name: String,
    /// Human description
    pub description: String,
    /// Accepted arguments
    pub arguments: Vec<PromptArgument>,
}

/// Message returned by `prompts/get`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Message role
    pub role: String,
    /// Message content
    pub content: Content,
}

/// Result of `prompts/get`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPromptResult {
    /// Prompt description
    pub description: String,
    /// Rendered messages
    pub messages: Vec<PromptMessage>,
}

/// MCP resource definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource URI
    pub uri: String,
    /// Display name
    pub name: String,
    /// Human description
    pub description: String,
    /// MIME type of the contents
    pub mime_type: String,
}

/// Contents returned by `resources/read`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// Resource URI
    pub uri: String,
    /// MIME type
    pub mime_type: String,
    /// Text body
    pub text: String,
}

/// Content block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text
    Text {
        /// Text body
        text: String,
    },
}

impl Content {
    /// Text block
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Result of `tools/call`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content blocks
    pub content: Vec<Content>,
    /// Whether the upstream API rejected the call
    pub is_error: bool,
}

/// Server identity reported by `initialize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Bridge display name
    pub name: String,
    /// Server version
    pub version: String,
}

/// Result of `initialize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Always `true`
    pub initialized: bool,
    /// MCP protocol revision spoken by the server
    pub protocol_version: String,
    /// Server identity
    pub server_info: ServerInfo,
    /// Advertised capabilities
    pub capabilities: Value,
}

impl InitializeResult {
    /// Initialize result for a bridge named `bridge_name`
    #[must_use]
    pub fn for_bridge(bridge_name: &str) -> Self {
        Self {
            initialized: true,
            protocol_version: MCP_PROTOCOL_VERSION.to_owned(),
            server_info: ServerInfo {
                name: bridge_name.to_owned(),
                version: BRIDGE_SERVER_VERSION.to_owned(),
            },
            capabilities: json!({
                "tools": {"listChanged": false},
                "prompts": {"listChanged": false},
                "resources": {"subscribe": false, "listChanged": false},
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_tool_result_wire_shape() {
        let result = CallToolResult {
            content: vec![Content::text("hello")],
            is_error: false,
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({"content": [{"type": "text", "text": "hello"}], "isError": false})
        );
    }

    #[test]
    fn test_initialize_wire_shape() {
        let value = serde_json::to_value(InitializeResult::for_bridge("Test Bridge")).unwrap();
        assert_eq!(value["initialized"], true);
        assert_eq!(value["serverInfo"], json!({"name": "Test Bridge", "version": "1.0.0"}));
        assert_eq!(value["protocolVersion"], "2024-11-05");
    }
}
