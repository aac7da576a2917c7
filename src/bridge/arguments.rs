// ABOUTME: Schema validation of tools/call arguments against an endpoint descriptor
// ABOUTME: Produces a typed, ordered argument record before any HTTP construction happens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Argument Validation
//!
//! Raw `tools/call` arguments are checked against the descriptor's declared
//! parameters (and request-body schema properties) and turned into
//! [`ValidatedArguments`]. The request translator only ever sees that record.
//!
//! Coercion rules:
//! - `string` accepts strings, numbers and booleans (stringified)
//! - `number` accepts numbers and numeric strings
//! - `boolean` accepts booleans and the strings `"true"` / `"false"`
//! - `object` and `array` accept only their own JSON type
//! - `null` counts as absent; undeclared keys are ignored

use bridge_core::{EndpointDescriptor, ParameterType};
use serde_json::{Map, Number, Value};

use crate::errors::{AppError, AppResult, ErrorCode};

/// A validated argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// String value
    String(String),
    /// Numeric value
    Number(Number),
    /// Boolean value
    Boolean(bool),
    /// JSON object
    Object(Map<String, Value>),
    /// JSON array
    Array(Vec<Value>),
}

impl ArgumentValue {
    /// Rendering used in path segments, query strings and form bodies
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::String(value) => value.clone(),
            Self::Number(value) => value.to_string(),
            Self::Boolean(value) => value.to_string(),
            Self::Object(value) => Value::Object(value.clone()).to_string(),
            Self::Array(value) => Value::Array(value.clone()).to_string(),
        }
    }

    /// JSON rendering used in JSON bodies
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(value) => Value::String(value.clone()),
            Self::Number(value) => Value::Number(value.clone()),
            Self::Boolean(value) => Value::Bool(*value),
            Self::Object(value) => Value::Object(value.clone()),
            Self::Array(value) => Value::Array(value.clone()),
        }
    }

    /// Take a body-schema property value by its own JSON type
    fn from_untyped(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(value) => Some(Self::Boolean(value)),
            Value::Number(value) => Some(Self::Number(value)),
            Value::String(value) => Some(Self::String(value)),
            Value::Array(value) => Some(Self::Array(value)),
            Value::Object(value) => Some(Self::Object(value)),
        }
    }
}

/// Where a validated argument came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentSource {
    /// A declared descriptor parameter
    Parameter,
    /// A property of the request-body schema
    BodyProperty,
}

/// One validated argument
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgument {
    /// Argument name
    pub name: String,
    /// Typed value
    pub value: ArgumentValue,
    /// Declaration source
    pub source: ArgumentSource,
}

/// Fully validated arguments in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments {
    arguments: Vec<ValidatedArgument>,
}

impl ValidatedArguments {
    /// Value of a named argument
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }

    /// Arguments in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ValidatedArgument> {
        self.arguments.iter()
    }

    /// Number of supplied arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Whether no argument was supplied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

fn type_mismatch(name: &str, expected: ParameterType) -> AppError {
    AppError::new(
        ErrorCode::InvalidFormat,
        format!(
            "Argument '{name}' must be of type {}",
            expected.json_schema_type()
        ),
    )
}

fn coerce(name: &str, expected: ParameterType, value: Value) -> AppResult<ArgumentValue> {
    match (expected, value) {
        (ParameterType::String, Value::String(value)) => Ok(ArgumentValue::String(value)),
        (ParameterType::String, Value::Number(value)) => Ok(ArgumentValue::String(value.to_string())),
        (ParameterType::String, Value::Bool(value)) => Ok(ArgumentValue::String(value.to_string())),
        (ParameterType::Number, Value::Number(value)) => Ok(ArgumentValue::Number(value)),
        (ParameterType::Number, Value::String(raw)) => {
            parse_number(raw.trim()).ok_or_else(|| type_mismatch(name, expected))
        }
        (ParameterType::Boolean, Value::Bool(value)) => Ok(ArgumentValue::Boolean(value)),
        (ParameterType::Boolean, Value::String(raw)) => match raw.trim() {
            "true" => Ok(ArgumentValue::Boolean(true)),
            "false" => Ok(ArgumentValue::Boolean(false)),
            _ => Err(type_mismatch(name, expected)),
        },
        (ParameterType::Object, Value::Object(value)) => Ok(ArgumentValue::Object(value)),
        (ParameterType::Array, Value::Array(value)) => Ok(ArgumentValue::Array(value)),
        _ => Err(type_mismatch(name, expected)),
    }
}

fn parse_number(raw: &str) -> Option<ArgumentValue> {
    if let Ok(integer) = raw.parse::<i64>() {
        return Some(ArgumentValue::Number(integer.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(ArgumentValue::Number)
}

fn body_schema_properties(descriptor: &EndpointDescriptor) -> (Vec<&str>, Vec<&str>) {
    let Some(schema) = descriptor.request_body.as_ref().map(|body| &body.schema) else {
        return (Vec::new(), Vec::new());
    };
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| properties.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|required| required.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    (properties, required)
}

/// Validate raw `tools/call` arguments against `descriptor`
///
/// `arguments` may be absent or `null`, which is the same as an empty object.
///
/// # Errors
///
/// Returns a missing-field error for the first required argument that is
/// absent and an invalid-format error for the first type mismatch. Both map
/// to JSON-RPC `-32602`.
pub fn validate_arguments(
    descriptor: &EndpointDescriptor,
    arguments: Option<&Value>,
) -> AppResult<ValidatedArguments> {
    let mut raw = match arguments {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(AppError::invalid_input("arguments must be an object")),
    };

    let mut validated = Vec::with_capacity(descriptor.parameters.len());
    for parameter in &descriptor.parameters {
        match raw.remove(&parameter.name).filter(|value| !value.is_null()) {
            Some(value) => validated.push(ValidatedArgument {
                value: coerce(&parameter.name, parameter.param_type, value)?,
                name: parameter.name.clone(),
                source: ArgumentSource::Parameter,
            }),
            None if parameter.required => return Err(AppError::missing_field(&parameter.name)),
            None => {}
        }
    }

    let (body_properties, body_required) = body_schema_properties(descriptor);
    for name in body_required {
        if descriptor.parameter(name).is_none() && raw.get(name).map_or(true, Value::is_null) {
            return Err(AppError::missing_field(name));
        }
    }
    for name in body_properties {
        if descriptor.parameter(name).is_some() {
            continue;
        }
        if let Some(value) = raw.remove(name).and_then(ArgumentValue::from_untyped) {
            validated.push(ValidatedArgument {
                name: name.to_owned(),
                value,
                source: ArgumentSource::BodyProperty,
            });
        }
    }

    Ok(ValidatedArguments {
        arguments: validated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::{HttpMethod, Parameter, RequestBodySchema};
    use serde_json::json;

    fn param(name: &str, param_type: ParameterType, required: bool) -> Parameter {
        Parameter {
            name: name.to_owned(),
            param_type,
            required,
            description: None,
        }
    }

    fn descriptor(parameters: Vec<Parameter>) -> EndpointDescriptor {
        EndpointDescriptor {
            name: "list_posts".to_owned(),
            method: HttpMethod::Get,
            path: "/posts".to_owned(),
            description: String::new(),
            parameters,
            request_body: None,
            enabled: true,
        }
    }

    #[test]
    fn test_missing_required_argument() {
        let d = descriptor(vec![param("id", ParameterType::Number, true)]);
        let error = validate_arguments(&d, Some(&json!({}))).unwrap_err();
        assert_eq!(error.code, ErrorCode::MissingRequiredField);
        assert_eq!(error.code.jsonrpc_code(), -32602);

        let error = validate_arguments(&d, Some(&json!({"id": null}))).unwrap_err();
        assert_eq!(error.code, ErrorCode::MissingRequiredField);
    }

    #[test]
    fn test_coercions() {
        let d = descriptor(vec![
            param("q", ParameterType::String, false),
            param("limit", ParameterType::Number, false),
            param("draft", ParameterType::Boolean, false),
        ]);
        let args =
            validate_arguments(&d, Some(&json!({"q": 42, "limit": "10", "draft": "false"}))).unwrap();
        assert_eq!(args.get("q"), Some(&ArgumentValue::String("42".to_owned())));
        assert_eq!(args.get("limit").unwrap().to_text(), "10");
        assert_eq!(args.get("draft"), Some(&ArgumentValue::Boolean(false)));
    }

    #[test]
    fn test_type_mismatch() {
        let d = descriptor(vec![param("tags", ParameterType::Array, false)]);
        let error = validate_arguments(&d, Some(&json!({"tags": "a,b"}))).unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidFormat);

        let d = descriptor(vec![param("limit", ParameterType::Number, false)]);
        assert!(validate_arguments(&d, Some(&json!({"limit": "ten"}))).is_err());
    }

    #[test]
    fn test_unknown_keys_ignored_and_order_kept() {
        let d = descriptor(vec![
            param("b", ParameterType::String, false),
            param("a", ParameterType::String, false),
        ]);
        let args =
            validate_arguments(&d, Some(&json!({"a": "1", "b": "2", "extra": true}))).unwrap();
        let names: Vec<_> = args.iter().map(|argument| argument.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_body_schema_properties_accepted() {
        let mut d = descriptor(vec![param("id", ParameterType::Number, true)]);
        d.method = HttpMethod::Post;
        d.request_body = Some(RequestBodySchema {
            content_type: "application/json".to_owned(),
            schema: json!({
                "type": "object",
                "properties": {"title": {"type": "string"}, "meta": {"type": "object"}},
                "required": ["title"]
            }),
        });

        let error = validate_arguments(&d, Some(&json!({"id": 1}))).unwrap_err();
        assert_eq!(error.code, ErrorCode::MissingRequiredField);

        let args = validate_arguments(
            &d,
            Some(&json!({"id": 1, "title": "Hello", "meta": {"k": "v"}})),
        )
        .unwrap();
        assert_eq!(args.len(), 3);
        assert!(args
            .iter()
            .any(|a| a.name == "title" && a.source == ArgumentSource::BodyProperty));
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let d = descriptor(vec![]);
        assert!(validate_arguments(&d, Some(&json!([1]))).is_err());
        assert!(validate_arguments(&d, None).unwrap().is_empty());
    }
}
