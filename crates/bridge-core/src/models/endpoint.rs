// ABOUTME: Endpoint descriptor model describing one REST endpoint exposed as an MCP tool
// ABOUTME: Holds method, path template, typed parameters and optional request-body schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content type used when a descriptor does not declare one
pub const DEFAULT_BODY_CONTENT_TYPE: &str = "application/json";

/// HTTP methods a bridge endpoint may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
}

impl HttpMethod {
    /// Canonical upper-case method name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// Whether non-path parameters travel in the request body for this method
    #[must_use]
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON type of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// String value
    String,
    /// Numeric value (integer or float)
    Number,
    /// Boolean value
    Boolean,
    /// JSON object
    Object,
    /// JSON array
    Array,
}

impl ParameterType {
    /// JSON Schema `type` keyword for this parameter type
    #[must_use]
    pub const fn json_schema_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// One declared endpoint parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name, matched against `{name}` path placeholders
    pub name: String,
    /// Declared JSON type
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Whether callers must supply the parameter
    #[serde(default)]
    pub required: bool,
    /// Human description surfaced in the tool schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body schema for endpoints that send a structured body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBodySchema {
    /// MIME type of the outbound body
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// JSON Schema describing the body shape
    #[serde(default)]
    pub schema: Value,
}

fn default_content_type() -> String {
    DEFAULT_BODY_CONTENT_TYPE.to_owned()
}

const fn default_true() -> bool {
    true
}

/// Typed description of a single REST endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    /// Endpoint name, sanitized into the MCP tool name
    pub name: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Path template with `{param}` placeholders, relative to the bridge base URL
    pub path: String,
    /// Human description
    #[serde(default)]
    pub description: String,
    /// Declared parameters in declaration order
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Optional request body schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodySchema>,
    /// Disabled endpoints are hidden from the tool catalog
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Violations of the endpoint descriptor invariants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// A `{` without a matching `}` (or the reverse) in the path template
    #[error("endpoint '{endpoint}': unbalanced braces in path template '{path}'")]
    UnbalancedTemplate {
        /// Endpoint name
        endpoint: String,
        /// Offending path template
        path: String,
    },
    /// A placeholder with no declared parameter of the same name
    #[error("endpoint '{endpoint}': path placeholder '{{{placeholder}}}' has no matching parameter")]
    UndeclaredPlaceholder {
        /// Endpoint name
        endpoint: String,
        /// Placeholder name
        placeholder: String,
    },
    /// The same parameter name declared more than once
    #[error("endpoint '{endpoint}': parameter '{parameter}' is declared more than once")]
    DuplicateParameter {
        /// Endpoint name
        endpoint: String,
        /// Duplicated parameter name
        parameter: String,
    },
    /// Empty endpoint name
    #[error("endpoint name must not be empty")]
    EmptyName,
}

impl EndpointDescriptor {
    /// Placeholder names found in the path template, in order of appearance
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::UnbalancedTemplate`] if braces do not pair up
    pub fn path_placeholders(&self) -> Result<Vec<&str>, DescriptorError> {
        let mut placeholders = Vec::new();
        let mut rest = self.path.as_str();

        while let Some(open) = rest.find(['{', '}']) {
            if rest.as_bytes()[open] == b'}' {
                return Err(self.unbalanced());
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| self.unbalanced())?;
            let name = &after[..close];
            if name.is_empty() || name.contains('{') {
                return Err(self.unbalanced());
            }
            placeholders.push(name);
            rest = &after[close + 1..];
        }

        Ok(placeholders)
    }

    /// Look up a declared parameter by name
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check the descriptor invariants
    ///
    /// Every `{param}` placeholder must correspond to exactly one declared
    /// parameter of the same name.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation found
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }

        let mut seen = HashSet::new();
        for parameter in &self.parameters {
            if !seen.insert(parameter.name.as_str()) {
                return Err(DescriptorError::DuplicateParameter {
                    endpoint: self.name.clone(),
                    parameter: parameter.name.clone(),
                });
            }
        }

        for placeholder in self.path_placeholders()? {
            if !seen.contains(placeholder) {
                return Err(DescriptorError::UndeclaredPlaceholder {
                    endpoint: self.name.clone(),
                    placeholder: placeholder.to_owned(),
                });
            }
        }

        Ok(())
    }

    fn unbalanced(&self) -> DescriptorError {
        DescriptorError::UnbalancedTemplate {
            endpoint: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(path: &str, params: &[&str]) -> EndpointDescriptor {
        EndpointDescriptor {
            name: "get_post".to_owned(),
            method: HttpMethod::Get,
            path: path.to_owned(),
            description: String::new(),
            parameters: params
                .iter()
                .map(|name| Parameter {
                    name: (*name).to_owned(),
                    param_type: ParameterType::String,
                    required: true,
                    description: None,
                })
                .collect(),
            request_body: None,
            enabled: true,
        }
    }

    #[test]
    fn test_placeholders_in_order() {
        let d = descriptor("/users/{user}/posts/{id}", &["user", "id"]);
        assert_eq!(d.path_placeholders().unwrap(), vec!["user", "id"]);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_undeclared_placeholder_rejected() {
        let d = descriptor("/posts/{id}", &["slug"]);
        assert!(matches!(
            d.validate(),
            Err(DescriptorError::UndeclaredPlaceholder { placeholder, .. }) if placeholder == "id"
        ));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let d = descriptor("/posts/{id}", &["id", "id"]);
        assert!(matches!(
            d.validate(),
            Err(DescriptorError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn test_unbalanced_template_rejected() {
        for path in ["/posts/{id", "/posts/id}", "/posts/{}", "/a/{b{c}}"] {
            let d = descriptor(path, &["id"]);
            assert!(
                matches!(d.validate(), Err(DescriptorError::UnbalancedTemplate { .. })),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_deserialize_defaults() {
        let d: EndpointDescriptor = serde_json::from_value(serde_json::json!({
            "name": "create",
            "method": "POST",
            "path": "/items",
            "requestBody": {"schema": {"type": "object"}}
        }))
        .unwrap();
        assert!(d.enabled);
        assert!(d.method.carries_body());
        assert_eq!(
            d.request_body.unwrap().content_type,
            DEFAULT_BODY_CONTENT_TYPE
        );
    }
}
