// ABOUTME: Injected rate limiting capability for MCP requests
// ABOUTME: RateLimiter trait with fixed-window DashMap limiter and an unlimited limiter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Rate Limiting
//!
//! The dispatcher asks a [`RateLimiter`] whether a key may proceed. The key
//! combines the bridge id with the caller identity, so one noisy caller cannot
//! starve others on the same bridge. Deployments that run several replicas
//! implement the trait over a shared store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::config::environment::RateLimitConfig;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Requests allowed per window (`None` when unlimited)
    pub limit: Option<u32>,
    /// Requests left in the current window
    pub remaining: Option<u32>,
    /// When the current window resets
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitDecision {
    /// Decision for an unlimited limiter
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            allowed: true,
            limit: None,
            remaining: None,
            reset_at: None,
        }
    }
}

/// Rate limiting capability
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key` and decide whether it may proceed
    fn check(&self, key: &str) -> RateLimitDecision;

    /// Release state for windows that have ended
    fn purge_expired(&self) {}
}

/// Limiter that allows everything
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlimitedRateLimiter;

impl RateLimiter for UnlimitedRateLimiter {
    fn check(&self, _key: &str) -> RateLimitDecision {
        RateLimitDecision::unlimited()
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    count: u32,
}

/// Fixed-window limiter keeping one counter per key
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl FixedWindowRateLimiter {
    /// Allow `limit` requests per `window` for each key
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// Allow `limit` requests per minute for each key
    #[must_use]
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::minutes(1))
    }

    /// Check `key` as of `now`
    #[must_use]
    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let mut window = self.windows.entry(key.to_owned()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if now - window.started_at >= self.window {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }

        let allowed = window.count < self.limit;
        if allowed {
            window.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: Some(self.limit),
            remaining: Some(self.limit.saturating_sub(window.count)),
            reset_at: Some(window.started_at + self.window),
        }
    }

    /// Drop windows that ended before `now`
    pub fn prune(&self, now: DateTime<Utc>) {
        self.windows
            .retain(|_, window| now - window.started_at < self.window);
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Utc::now())
    }

    fn purge_expired(&self) {
        self.prune(Utc::now());
    }
}

/// Build the limiter described by `config`
#[must_use]
pub fn limiter_from_config(config: &RateLimitConfig) -> Arc<dyn RateLimiter> {
    if config.requests_per_minute == 0 {
        Arc::new(UnlimitedRateLimiter)
    } else {
        Arc::new(FixedWindowRateLimiter::per_minute(config.requests_per_minute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_enforced_per_key() {
        let limiter = FixedWindowRateLimiter::per_minute(2);
        let now = Utc::now();
        assert!(limiter.check_at("b1:a", now).allowed);
        assert!(limiter.check_at("b1:a", now).allowed);
        let denied = limiter.check_at("b1:a", now);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, Some(0));

        assert!(limiter.check_at("b1:b", now).allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = FixedWindowRateLimiter::per_minute(1);
        let now = Utc::now();
        assert!(limiter.check_at("k", now).allowed);
        assert!(!limiter.check_at("k", now + Duration::seconds(30)).allowed);
        assert!(limiter.check_at("k", now + Duration::seconds(61)).allowed);
    }

    #[test]
    fn test_prune_drops_expired_windows() {
        let limiter = FixedWindowRateLimiter::per_minute(5);
        let now = Utc::now();
        let _ = limiter.check_at("k", now);
        limiter.prune(now + Duration::minutes(2));
        assert!(limiter.windows.is_empty());
    }

    #[test]
    fn test_zero_means_unlimited() {
        let limiter = limiter_from_config(&RateLimitConfig {
            requests_per_minute: 0,
        });
        for _ in 0..1000 {
            assert!(limiter.check("k").allowed);
        }
    }
}
