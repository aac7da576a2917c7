// ABOUTME: Translation of validated tool arguments into an outbound HTTP request
// ABOUTME: Path templating, query or body placement by method, static header merging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use bridge_core::{BridgeConfiguration, EndpointDescriptor, HttpMethod, DEFAULT_BODY_CONTENT_TYPE};
use serde_json::{Map, Value};
use url::Url;

use super::arguments::ValidatedArguments;
use crate::errors::{AppError, AppResult, ErrorCode};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Outbound request body
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    /// JSON document sent with the descriptor's content type
    Json {
        /// Content type header value
        content_type: String,
        /// Body document
        value: Value,
    },
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
}

/// Fully formed outbound HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Base URL joined with the templated path, without query
    pub url: Url,
    /// Header pairs; names compared case-insensitively
    pub headers: Vec<(String, String)>,
    /// Query pairs appended to `url`
    pub query: Vec<(String, String)>,
    /// Optional body
    pub body: Option<OutboundBody>,
}

impl OutboundRequest {
    /// Bare request for `method` against `url`
    #[must_use]
    pub const fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Set a header, replacing any existing header of the same name
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.into()));
    }

    /// Value of a header, if set
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a query parameter, replacing any existing parameter of the same name
    pub fn set_query(&mut self, name: &str, value: impl Into<String>) {
        self.query.retain(|(existing, _)| existing != name);
        self.query.push((name.to_owned(), value.into()));
    }

    /// Final URL including the query string
    #[must_use]
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                self.query
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );
        }
        url
    }
}

/// Join a base URL and a path with exactly one slash between them
///
/// Any query or fragment already present on the base URL is kept.
///
/// # Errors
///
/// Returns an invalid-input error if `base` is not an absolute URL
pub fn join_url(base: &str, path: &str) -> AppResult<Url> {
    let mut url = Url::parse(base.trim())
        .map_err(|e| AppError::invalid_input(format!("Invalid base URL '{base}': {e}")))?;
    let base_path = url.path().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let joined = if path.is_empty() {
        if base_path.is_empty() {
            "/".to_owned()
        } else {
            base_path.to_owned()
        }
    } else {
        format!("{base_path}/{path}")
    };
    url.set_path(&joined);
    Ok(url)
}

fn render_path(descriptor: &EndpointDescriptor, arguments: &ValidatedArguments) -> AppResult<String> {
    let mut rendered = descriptor.path.clone();
    for placeholder in descriptor.path_placeholders()? {
        let value = arguments
            .get(placeholder)
            .ok_or_else(|| AppError::missing_field(placeholder))?;
        let text = value.to_text();
        // URL joining resolves dot segments, even percent-encoded ones
        if text == "." || text == ".." {
            return Err(AppError::new(
                ErrorCode::InvalidFormat,
                format!("Path parameter '{placeholder}' cannot be a dot segment"),
            ));
        }
        rendered = rendered.replace(&format!("{{{placeholder}}}"), &urlencoding::encode(&text));
    }
    Ok(rendered)
}

/// Build the outbound request for one validated tool call
///
/// Path placeholders are replaced by the URL-encoded argument. The remaining
/// arguments go to the query string for GET and DELETE and to the body for
/// POST, PUT and PATCH. A form content type on the request-body schema sends
/// them form-encoded; anything else sends a JSON object. Static bridge
/// headers are applied first so authentication can override them.
///
/// # Errors
///
/// Returns an invalid-params error if a path argument is missing or is a
/// `.`/`..` dot segment, or an
/// invalid-input error for a malformed base URL or path template
pub fn build_request(
    bridge: &BridgeConfiguration,
    descriptor: &EndpointDescriptor,
    arguments: &ValidatedArguments,
) -> AppResult<OutboundRequest> {
    let path = render_path(descriptor, arguments)?;
    let placeholders = descriptor.path_placeholders()?;
    let mut request = OutboundRequest::new(descriptor.method, join_url(&bridge.base_url, &path)?);

    for (name, value) in &bridge.headers {
        request.set_header(name, value.as_str());
    }

    let remaining = arguments
        .iter()
        .filter(|argument| !placeholders.contains(&argument.name.as_str()));

    if descriptor.method.carries_body() {
        let content_type = descriptor
            .request_body
            .as_ref()
            .map_or(DEFAULT_BODY_CONTENT_TYPE, |body| body.content_type.as_str());
        if content_type.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
            let pairs: Vec<_> = remaining
                .map(|argument| (argument.name.clone(), argument.value.to_text()))
                .collect();
            request.body = Some(OutboundBody::Form(pairs));
        } else {
            let object: Map<String, Value> = remaining
                .map(|argument| (argument.name.clone(), argument.value.to_json()))
                .collect();
            if !object.is_empty() || descriptor.request_body.is_some() {
                request.body = Some(OutboundBody::Json {
                    content_type: content_type.to_owned(),
                    value: Value::Object(object),
                });
            }
        }
    } else {
        for argument in remaining {
            request
                .query
                .push((argument.name.clone(), argument.value.to_text()));
        }
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::arguments::validate_arguments;
    use bridge_core::{AccessPolicy, AuthConfig, Parameter, ParameterType, RequestBodySchema};
    use chrono::Utc;
    use serde_json::json;

    fn bridge(base_url: &str) -> BridgeConfiguration {
        let now = Utc::now();
        BridgeConfiguration {
            id: "b1".to_owned(),
            user_id: "u1".to_owned(),
            name: "Test Bridge".to_owned(),
            description: None,
            enabled: true,
            base_url: base_url.to_owned(),
            auth: AuthConfig::None,
            headers: [("X-Client".to_owned(), "bridge".to_owned())].into(),
            access: AccessPolicy::default(),
            endpoints: vec![],
            timeout_ms: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn endpoint(method: HttpMethod, path: &str, parameters: &[(&str, ParameterType)]) -> EndpointDescriptor {
        EndpointDescriptor {
            name: "op".to_owned(),
            method,
            path: path.to_owned(),
            description: String::new(),
            parameters: parameters
                .iter()
                .map(|(name, param_type)| Parameter {
                    name: (*name).to_owned(),
                    param_type: *param_type,
                    required: false,
                    description: None,
                })
                .collect(),
            request_body: None,
            enabled: true,
        }
    }

    #[test]
    fn test_join_url_slashes() {
        for (base, path) in [
            ("https://api.example.com", "/posts"),
            ("https://api.example.com/", "posts"),
            ("https://api.example.com/", "/posts"),
        ] {
            assert_eq!(
                join_url(base, path).unwrap().as_str(),
                "https://api.example.com/posts"
            );
        }
        assert_eq!(
            join_url("https://api.example.com/v1/", "/posts").unwrap().as_str(),
            "https://api.example.com/v1/posts"
        );
    }

    #[test]
    fn test_path_parameter_consumed() {
        let descriptor = endpoint(
            HttpMethod::Get,
            "/posts/{id}",
            &[("id", ParameterType::Number), ("expand", ParameterType::Boolean)],
        );
        let args = validate_arguments(&descriptor, Some(&json!({"id": 5, "expand": true}))).unwrap();
        let request = build_request(&bridge("https://api.example.com"), &descriptor, &args).unwrap();

        assert_eq!(
            request.full_url().as_str(),
            "https://api.example.com/posts/5?expand=true"
        );
        assert!(request.body.is_none());
        assert_eq!(request.header("x-client"), Some("bridge"));
    }

    #[test]
    fn test_path_value_is_encoded() {
        let descriptor = endpoint(HttpMethod::Delete, "/files/{name}", &[("name", ParameterType::String)]);
        let args = validate_arguments(&descriptor, Some(&json!({"name": "a b/c"}))).unwrap();
        let request = build_request(&bridge("https://api.example.com"), &descriptor, &args).unwrap();
        assert_eq!(request.url.path(), "/files/a%20b%2Fc");
    }

    #[test]
    fn test_dot_segment_path_values_are_rejected() {
        let descriptor = endpoint(
            HttpMethod::Get,
            "/users/me/files/{name}",
            &[("name", ParameterType::String)],
        );
        for name in [".", ".."] {
            let args = validate_arguments(&descriptor, Some(&json!({ "name": name }))).unwrap();
            let error =
                build_request(&bridge("https://api.example.com/v1"), &descriptor, &args).unwrap_err();
            assert_eq!(error.code, ErrorCode::InvalidFormat);
            assert_eq!(error.code.jsonrpc_code(), -32602);
        }

        let args = validate_arguments(&descriptor, Some(&json!({"name": "..hidden"}))).unwrap();
        let request =
            build_request(&bridge("https://api.example.com/v1"), &descriptor, &args).unwrap();
        assert_eq!(request.url.path(), "/v1/users/me/files/..hidden");
    }

    #[test]
    fn test_post_places_remaining_in_json_body() {
        let descriptor = endpoint(
            HttpMethod::Post,
            "/users/{user}/posts",
            &[("user", ParameterType::String), ("title", ParameterType::String)],
        );
        let args =
            validate_arguments(&descriptor, Some(&json!({"user": "42", "title": "Hi"}))).unwrap();
        let request = build_request(&bridge("https://api.example.com"), &descriptor, &args).unwrap();

        assert!(request.query.is_empty());
        assert_eq!(
            request.body,
            Some(OutboundBody::Json {
                content_type: "application/json".to_owned(),
                value: json!({"title": "Hi"}),
            })
        );
    }

    #[test]
    fn test_form_content_type() {
        let mut descriptor = endpoint(HttpMethod::Put, "/settings", &[("theme", ParameterType::String)]);
        descriptor.request_body = Some(RequestBodySchema {
            content_type: FORM_CONTENT_TYPE.to_owned(),
            schema: json!({}),
        });
        let args = validate_arguments(&descriptor, Some(&json!({"theme": "dark"}))).unwrap();
        let request = build_request(&bridge("https://api.example.com"), &descriptor, &args).unwrap();
        assert_eq!(
            request.body,
            Some(OutboundBody::Form(vec![("theme".to_owned(), "dark".to_owned())]))
        );
    }

    #[test]
    fn test_missing_path_argument() {
        let descriptor = endpoint(HttpMethod::Get, "/posts/{id}", &[("id", ParameterType::Number)]);
        let args = validate_arguments(&descriptor, Some(&json!({}))).unwrap();
        let error = build_request(&bridge("https://api.example.com"), &descriptor, &args).unwrap_err();
        assert_eq!(error.code.jsonrpc_code(), -32602);
    }
}
