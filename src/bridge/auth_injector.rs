// ABOUTME: Upstream authentication injection for outbound bridge requests
// ABOUTME: Applies bearer, API key (header or query) and basic credentials to an outbound request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_core::{ApiKeyLocation, AuthConfig};

use super::request::OutboundRequest;

/// Apply `auth` to `request`
///
/// Operates on opened (plaintext) secrets. Credentials replace any header or
/// query entry of the same name already present on the request.
#[must_use]
pub fn inject_auth<S: AsRef<str>>(auth: &AuthConfig<S>, mut request: OutboundRequest) -> OutboundRequest {
    match auth {
        AuthConfig::None => {}
        AuthConfig::Bearer { token } => {
            request.set_header("Authorization", format!("Bearer {}", token.as_ref()));
        }
        AuthConfig::ApiKey {
            key,
            location: ApiKeyLocation::Header,
            param_name,
        } => request.set_header(param_name, key.as_ref()),
        AuthConfig::ApiKey {
            key,
            location: ApiKeyLocation::Query,
            param_name,
        } => request.set_query(param_name, key.as_ref()),
        AuthConfig::Basic { username, password } => {
            let credentials = STANDARD.encode(format!("{username}:{}", password.as_ref()));
            request.set_header("Authorization", format!("Basic {credentials}"));
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::HttpMethod;
    use url::Url;

    fn request() -> OutboundRequest {
        let mut request = OutboundRequest::new(
            HttpMethod::Get,
            Url::parse("https://api.example.com/posts").unwrap(),
        );
        request.set_header("authorization", "from-static-headers");
        request
    }

    #[test]
    fn test_none_leaves_request_unchanged() {
        let before = request();
        let after = inject_auth(&AuthConfig::<String>::None, before.clone());
        assert_eq!(before, after);
    }

    #[test]
    fn test_bearer_overrides_static_header() {
        let request = inject_auth(
            &AuthConfig::Bearer {
                token: "abc".to_owned(),
            },
            request(),
        );
        assert_eq!(request.header("Authorization"), Some("Bearer abc"));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_api_key_header_and_query() {
        let header = inject_auth(
            &AuthConfig::ApiKey {
                key: "k1",
                location: ApiKeyLocation::Header,
                param_name: "X-Api-Key".to_owned(),
            },
            request(),
        );
        assert_eq!(header.header("x-api-key"), Some("k1"));

        let query = inject_auth(
            &AuthConfig::ApiKey {
                key: "k2",
                location: ApiKeyLocation::Query,
                param_name: "api_key".to_owned(),
            },
            request(),
        );
        assert_eq!(
            query.full_url().as_str(),
            "https://api.example.com/posts?api_key=k2"
        );
    }

    #[test]
    fn test_basic() {
        let request = inject_auth(
            &AuthConfig::Basic {
                username: "alice".to_owned(),
                password: "s3cret".to_owned(),
            },
            request(),
        );
        assert_eq!(
            request.header("Authorization"),
            Some("Basic YWxpY2U6czNjcmV0")
        );
    }
}
