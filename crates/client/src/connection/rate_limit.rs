// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side send budget over a rolling window.
//!
//! Advisory and drop-on-client: a send over budget is rejected, never
//! queued or delayed. Heartbeat traffic is not counted; the configured
//! reserve keeps room for it under the server's own ceiling.

use std::time::Duration;

use tokio::time::Instant;

/// Counter state for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Sends recorded in this window.
    pub count: u32,
    /// When the window opened.
    pub window_start: Instant,
}

/// Fixed-budget limiter whose window restarts once its length has elapsed.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    ceiling: u32,
    window_len: Duration,
    window: RateWindow,
}

impl RateLimiter {
    /// Creates a limiter allowing `ceiling` sends per `window_len`.
    pub fn new(ceiling: u32, window_len: Duration, now: Instant) -> Self {
        RateLimiter {
            ceiling,
            window_len,
            window: RateWindow {
                count: 0,
                window_start: now,
            },
        }
    }

    /// Returns true if one more send fits in the current window.
    pub fn check(&mut self, now: Instant) -> bool {
        self.roll(now);
        self.window.count < self.ceiling
    }

    /// Records a completed send.
    pub fn record(&mut self, now: Instant) {
        self.roll(now);
        self.window.count = self.window.count.saturating_add(1);
    }

    /// Starts a fresh window.
    pub fn reset(&mut self, now: Instant) {
        self.window = RateWindow {
            count: 0,
            window_start: now,
        };
    }

    /// Sends allowed per window.
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Current window state.
    pub fn window(&self) -> RateWindow {
        self.window
    }

    fn roll(&mut self, now: Instant) {
        if now.saturating_duration_since(self.window.window_start) >= self.window_len {
            self.reset(now);
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
