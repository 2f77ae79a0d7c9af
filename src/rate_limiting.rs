// ABOUTME: Per-user rate limiting for the chat endpoint
// ABOUTME: Fixed-window counters held in an injected in-memory map
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Growth Engine

//! # Rate Limiting
//!
//! A per-user fixed-window counter: the first request in a window stamps the
//! reset time, subsequent requests increment the count until the limit, and
//! the counter resets once the window passes. Single-instance only; a
//! multi-instance deployment would count independently per process.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::config::RateLimitConfig;

/// Rate limit status attached to a decision
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatus {
    /// Whether the request was rejected
    pub is_rate_limited: bool,
    /// Maximum requests allowed in the current window
    pub limit: u32,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// When the current window resets
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Per-user fixed-window rate limiter
pub struct RateLimiter {
    windows: DashMap<Uuid, WindowState>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter from configuration
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests: config.chat_requests,
            window: Duration::seconds(config.window_secs as i64),
        }
    }

    /// Record a request for the user and decide whether it is allowed
    pub fn check(&self, user_id: Uuid) -> RateLimitStatus {
        let now = Utc::now();
        let mut entry = self.windows.entry(user_id).or_insert(WindowState {
            count: 0,
            reset_at: now + self.window,
        });

        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }

        if entry.count >= self.max_requests {
            return RateLimitStatus {
                is_rate_limited: true,
                limit: self.max_requests,
                remaining: 0,
                reset_at: entry.reset_at,
            };
        }

        entry.count += 1;
        RateLimitStatus {
            is_rate_limited: false,
            limit: self.max_requests,
            remaining: self.max_requests - entry.count,
            reset_at: entry.reset_at,
        }
    }
}
