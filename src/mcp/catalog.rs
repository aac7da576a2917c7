// ABOUTME: Tool, prompt and resource catalogs derived from a bridge's endpoint descriptors
// ABOUTME: Sanitizes and de-duplicates tool names and builds JSON Schema input shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Catalog
//!
//! The catalog is rebuilt from the bridge snapshot on every request, so
//! `tools/list` and `tools/call` always agree on the name of each tool.

use bridge_core::{BridgeConfiguration, EndpointDescriptor};
use serde_json::{json, Map, Value};

use super::schema::{
    Content, GetPromptResult, Prompt, PromptArgument, PromptMessage, Resource, ResourceContents,
    Tool,
};
use crate::constants::catalog::{FALLBACK_TOOL_NAME, MAX_TOOL_NAME_LEN};
use crate::constants::protocol::{RESOURCE_MIME_TYPE, RESOURCE_URI_SCHEME};
use crate::errors::{AppError, AppResult};

/// Reduce an endpoint name to `[A-Za-z0-9_-]`, at most 64 characters
#[must_use]
pub fn sanitize_tool_name(raw: &str) -> String {
    let mut sanitized = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' };
        if c == '_' && sanitized.ends_with('_') {
            continue;
        }
        sanitized.push(c);
    }
    let trimmed = sanitized.trim_matches('_');
    let mut name = if trimmed.is_empty() {
        FALLBACK_TOOL_NAME.to_owned()
    } else {
        trimmed.to_owned()
    };
    name.truncate(MAX_TOOL_NAME_LEN);
    name
}

fn unique_name(base: String, taken: &[String]) -> String {
    if !taken.contains(&base) {
        return base;
    }
    let mut n = 2_usize;
    loop {
        let suffix = format!("_{n}");
        let mut candidate = base.clone();
        candidate.truncate(MAX_TOOL_NAME_LEN - suffix.len());
        candidate.push_str(&suffix);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// JSON Schema for the arguments of `descriptor`
#[must_use]
pub fn input_schema(descriptor: &EndpointDescriptor) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for parameter in &descriptor.parameters {
        let mut property = json!({"type": parameter.param_type.json_schema_type()});
        if let Some(description) = &parameter.description {
            property["description"] = Value::String(description.clone());
        }
        properties.insert(parameter.name.clone(), property);
        if parameter.required {
            required.push(Value::String(parameter.name.clone()));
        }
    }

    if let Some(body) = &descriptor.request_body {
        if let Some(body_properties) = body.schema.get("properties").and_then(Value::as_object) {
            for (name, property) in body_properties {
                properties
                    .entry(name.clone())
                    .or_insert_with(|| property.clone());
            }
        }
        if let Some(body_required) = body.schema.get("required").and_then(Value::as_array) {
            for name in body_required.iter().filter_map(Value::as_str) {
                let name = Value::String(name.to_owned());
                if !required.contains(&name) {
                    required.push(name);
                }
            }
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// One tool and the endpoint it calls
#[derive(Debug, Clone)]
pub struct CatalogEntry<'a> {
    /// Unique tool name
    pub tool_name: String,
    /// Endpoint behind the tool
    pub descriptor: &'a EndpointDescriptor,
}

/// Catalog of one bridge snapshot
#[derive(Debug, Clone)]
pub struct ToolCatalog<'a> {
    bridge: &'a BridgeConfiguration,
    entries: Vec<CatalogEntry<'a>>,
}

impl<'a> ToolCatalog<'a> {
    /// Catalog over the enabled endpoints of `bridge`, in descriptor order
    #[must_use]
    pub fn build(bridge: &'a BridgeConfiguration) -> Self {
        let mut taken: Vec<String> = Vec::new();
        let entries = bridge
            .enabled_endpoints()
            .map(|descriptor| {
                let tool_name = unique_name(sanitize_tool_name(&descriptor.name), &taken);
                taken.push(tool_name.clone());
                CatalogEntry {
                    tool_name,
                    descriptor,
                }
            })
            .collect();
        Self { bridge, entries }
    }

    /// Catalog entries in order
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry<'a>] {
        &self.entries
    }

    /// Endpoint behind tool `name`
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&'a EndpointDescriptor> {
        self.entries
            .iter()
            .find(|entry| entry.tool_name == name)
            .map(|entry| entry.descriptor)
    }

    /// MCP tool definitions
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.entries
            .iter()
            .map(|entry| Tool {
                name: entry.tool_name.clone(),
                description: tool_description(entry.descriptor),
                input_schema: input_schema(entry.descriptor),
            })
            .collect()
    }

    /// One prompt per tool
    #[must_use]
    pub fn prompts(&self) -> Vec<Prompt> {
        self.entries
            .iter()
            .map(|entry| Prompt {
                name: entry.tool_name.clone(),
                description: format!(
                    "Call {} on {}: {}",
                    entry.tool_name,
                    self.bridge.name,
                    tool_description(entry.descriptor)
                ),
                arguments: entry
                    .descriptor
                    .parameters
                    .iter()
                    .map(|parameter| PromptArgument {
                        name: parameter.name.clone(),
                        description: parameter.description.clone(),
                        required: parameter.required,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Render prompt `name` with `arguments`
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if no such prompt exists
    pub fn prompt(&self, name: &str, arguments: &Map<String, Value>) -> AppResult<GetPromptResult> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.tool_name == name)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown prompt: {name}")))?;
        let rendered_arguments = serde_json::to_string_pretty(arguments)?;
        let text = format!(
            "Use the `{}` tool ({} {}) with these arguments:\n{rendered_arguments}",
            entry.tool_name, entry.descriptor.method, entry.descriptor.path
        );
        Ok(GetPromptResult {
            description: tool_description(entry.descriptor),
            messages: vec![PromptMessage {
                role: "user".to_owned(),
                content: Content::text(text),
            }],
        })
    }

    fn overview_uri(&self) -> String {
        format!("{RESOURCE_URI_SCHEME}{}/overview", self.bridge.id)
    }

    fn tool_uri(&self, tool_name: &str) -> String {
        format!("{RESOURCE_URI_SCHEME}{}/tools/{tool_name}", self.bridge.id)
    }

    /// Overview resource followed by one resource per tool
    #[must_use]
    pub fn resources(&self) -> Vec<Resource> {
        let mut resources = Vec::with_capacity(self.entries.len() + 1);
        resources.push(Resource {
            uri: self.overview_uri(),
            name: format!("{} overview", self.bridge.name),
            description: "Bridge summary and tool index".to_owned(),
            mime_type: RESOURCE_MIME_TYPE.to_owned(),
        });
        resources.extend(self.entries.iter().map(|entry| Resource {
            uri: self.tool_uri(&entry.tool_name),
            name: entry.tool_name.clone(),
            description: tool_description(entry.descriptor),
            mime_type: RESOURCE_MIME_TYPE.to_owned(),
        }));
        resources
    }

    /// Read the resource at `uri`
    ///
    /// Documents describe endpoints and the auth scheme only; secrets are
    /// never included.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for an unknown URI
    pub fn read_resource(&self, uri: &str) -> AppResult<ResourceContents> {
        let document = if uri == self.overview_uri() {
            json!({
                "id": self.bridge.id,
                "name": self.bridge.name,
                "description": self.bridge.description,
                "baseUrl": self.bridge.base_url,
                "auth": self.bridge.auth.scheme(),
                "tools": self.entries.iter().map(|entry| json!({
                    "name": entry.tool_name,
                    "method": entry.descriptor.method,
                    "path": entry.descriptor.path,
                    "description": entry.descriptor.description,
                })).collect::<Vec<_>>(),
            })
        } else {
            let entry = self
                .entries
                .iter()
                .find(|entry| self.tool_uri(&entry.tool_name) == uri)
                .ok_or_else(|| AppError::invalid_input(format!("Unknown resource: {uri}")))?;
            json!({
                "tool": entry.tool_name,
                "endpoint": entry.descriptor.name,
                "method": entry.descriptor.method,
                "path": entry.descriptor.path,
                "description": entry.descriptor.description,
                "parameters": entry.descriptor.parameters,
                "requestBody": entry.descriptor.request_body,
                "inputSchema": input_schema(entry.descriptor),
            })
        };
        Ok(ResourceContents {
            uri: uri.to_owned(),
            mime_type: RESOURCE_MIME_TYPE.to_owned(),
            text: serde_json::to_string_pretty(&document)?,
        })
    }
}

fn tool_description(descriptor: &EndpointDescriptor) -> String {
    if descriptor.description.trim().is_empty() {
        format!("{} {}", descriptor.method, descriptor.path)
    } else {
        descriptor.description.clone()
    }
}
