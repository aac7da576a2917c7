// ABOUTME: Environment-based configuration for the bridge server
// ABOUTME: Parses BRIDGE_* variables into ServerConfig with logging and rate limit sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-only configuration
//!
//! The server has no configuration file. Every setting comes from a
//! `BRIDGE_*` environment variable with a documented default; the only
//! mandatory variable is `BRIDGE_ENCRYPTION_SECRET`.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::constants::defaults;
use crate::errors::{AppError, AppResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-line human format
    Pretty,
    /// Single-line human format
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" | "" => Ok(Self::Compact),
            other => Err(AppError::config(format!(
                "BRIDGE_LOG_FORMAT must be json, pretty or compact (got '{other}')"
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_owned(),
            format: LogFormat::default(),
        }
    }
}

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests per minute per bridge and caller; 0 disables limiting
    pub requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: defaults::RATE_LIMIT_PER_MINUTE,
        }
    }
}

/// Process-wide server configuration, read-only after startup
#[derive(Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Secret the sealing key is derived from
    pub encryption_secret: Zeroizing<String>,
    /// HS256 secret for owner sessions; `None` disables session auth
    pub session_secret: Option<Zeroizing<String>>,
    /// Default upstream timeout when a bridge sets none
    pub upstream_timeout: Duration,
    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
    /// Rate limit settings
    pub rate_limit: RateLimitConfig,
    /// Inbound body size limit in bytes
    pub max_body_bytes: usize,
    /// Upstream body bytes kept before truncation
    pub max_upstream_body_bytes: usize,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Optional JSON seed file of bridge definitions
    pub bridges_file: Option<PathBuf>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("http_port", &self.http_port)
            .field("session_auth", &self.session_secret.is_some())
            .field("upstream_timeout", &self.upstream_timeout)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit", &self.rate_limit)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("max_upstream_body_bytes", &self.max_upstream_body_bytes)
            .field("logging", &self.logging)
            .field("bridges_file", &self.bridges_file)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Configuration with every default and the given encryption secret
    #[must_use]
    pub fn new(encryption_secret: impl Into<String>) -> Self {
        Self {
            host: defaults::HOST.to_owned(),
            http_port: defaults::HTTP_PORT,
            encryption_secret: Zeroizing::new(encryption_secret.into()),
            session_secret: None,
            upstream_timeout: Duration::from_millis(defaults::UPSTREAM_TIMEOUT_MS),
            cors_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            max_body_bytes: defaults::MAX_BODY_BYTES,
            max_upstream_body_bytes: defaults::MAX_UPSTREAM_BODY_BYTES,
            logging: LoggingConfig::default(),
            bridges_file: None,
        }
    }

    /// Enable owner sessions signed with `secret`
    #[must_use]
    pub fn with_session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = Some(Zeroizing::new(secret.into()));
        self
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if `BRIDGE_ENCRYPTION_SECRET` is missing or
    /// empty, or if any variable fails to parse
    pub fn from_env() -> AppResult<Self> {
        let encryption_secret = env::var("BRIDGE_ENCRYPTION_SECRET")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::config("BRIDGE_ENCRYPTION_SECRET must be set"))?;

        let mut config = Self::new(encryption_secret);

        if let Some(host) = non_empty_var("BRIDGE_HOST") {
            config.host = host;
        }
        config.http_port = parse_var("BRIDGE_HTTP_PORT", defaults::HTTP_PORT)?;
        config.session_secret = non_empty_var("BRIDGE_SESSION_SECRET").map(Zeroizing::new);
        config.upstream_timeout = Duration::from_millis(parse_var(
            "BRIDGE_UPSTREAM_TIMEOUT_MS",
            defaults::UPSTREAM_TIMEOUT_MS,
        )?);
        config.cors_origins = non_empty_var("BRIDGE_CORS_ORIGINS")
            .map(|origins| parse_origins(&origins))
            .unwrap_or_default();
        config.rate_limit.requests_per_minute = parse_var(
            "BRIDGE_RATE_LIMIT_PER_MINUTE",
            defaults::RATE_LIMIT_PER_MINUTE,
        )?;
        config.max_body_bytes = parse_var("BRIDGE_MAX_BODY_BYTES", defaults::MAX_BODY_BYTES)?;
        config.max_upstream_body_bytes = parse_var(
            "BRIDGE_MAX_UPSTREAM_BODY_BYTES",
            defaults::MAX_UPSTREAM_BODY_BYTES,
        )?;
        if let Some(level) = non_empty_var("BRIDGE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = non_empty_var("BRIDGE_LOG_FORMAT") {
            config.logging.format = format.parse()?;
        }
        config.bridges_file = non_empty_var("BRIDGE_BRIDGES_FILE").map(PathBuf::from);

        if config.upstream_timeout.is_zero() {
            return Err(AppError::config(
                "BRIDGE_UPSTREAM_TIMEOUT_MS must be greater than zero",
            ));
        }

        Ok(config)
    }

    /// Whether owner sessions are enabled
    #[must_use]
    pub const fn session_auth_enabled(&self) -> bool {
        self.session_secret.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    non_empty_var(name).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| AppError::config(format!("{name} is invalid ('{raw}'): {e}")))
    })
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.example , ,https://b.example"),
            vec!["https://a.example".to_owned(), "https://b.example".to_owned()]
        );
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = ServerConfig::new("super-secret-value").with_session_secret("jwt-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("jwt-secret"));
        assert!(rendered.contains("session_auth: true"));
    }
}
