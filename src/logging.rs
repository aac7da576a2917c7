// ABOUTME: Structured logging setup built on tracing-subscriber
// ABOUTME: EnvFilter with RUST_LOG override and json, pretty or compact output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Logging initialization
//!
//! `RUST_LOG` wins over the configured level so operators can raise verbosity
//! for a single module without touching `BRIDGE_LOG_LEVEL`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::environment::{LogFormat, LoggingConfig};
use crate::errors::{AppError, AppResult};

/// Build the filter from `RUST_LOG`, falling back to the configured level
///
/// # Errors
///
/// Returns a config error if the configured directive is malformed
pub fn build_filter(config: &LoggingConfig) -> AppResult<EnvFilter> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.level).map_err(|e| {
            AppError::config(format!(
                "Invalid log level directive '{}': {e}",
                config.level
            ))
        })
    })
}

/// Install the global subscriber
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
///
/// # Errors
///
/// Returns a config error if the level directive is malformed
pub fn init_logging(config: &LoggingConfig) -> AppResult<()> {
    let filter = build_filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(format = ?config.format, level = %config.level, "Logging initialized");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_malformed_directive_rejected_without_rust_log() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "bridge=notalevel".to_owned(),
            format: LogFormat::Compact,
        };
        assert!(build_filter(&config).is_err());
    }
}
