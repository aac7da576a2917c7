// ABOUTME: HTTP cookie helpers for owner session extraction
// ABOUTME: Reads named cookie values from request headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::http::{header, HeaderMap};

/// Extract a cookie value from request headers
///
/// Every `Cookie` header is searched, since HTTP/2 clients may split cookies
/// across several header fields.
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name.trim() == cookie_name).then(|| value.trim().to_owned())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; bridge_session=abc.def.ghi"),
        );
        assert_eq!(
            get_cookie_value(&headers, "bridge_session").as_deref(),
            Some("abc.def.ghi")
        );
        assert!(get_cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn test_split_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(get_cookie_value(&headers, "b").as_deref(), Some("2"));
    }
}
