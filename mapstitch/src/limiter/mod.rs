//! Sliding-window rate limiting
//!
//! Each identity (a chat channel, a user, an API key) gets its own window
//! of recent call stamps. A call is allowed while the number of live
//! stamps stays within the configured budget; stamps expire as the window
//! slides forward, no background sweeper involved.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::error::RenderError;

/// Rate-limit budget per identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Calls allowed per window.
    pub max_calls: usize,
    /// Window length in seconds.
    pub window_secs: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 10,
            window_secs: 120.0,
        }
    }
}

/// Sliding-window rate limiter over arbitrary identities.
///
/// Stamps are stored at one-decisecond resolution; two calls within the
/// same decisecond both count. A cost offset shifts a stamp into the
/// future (expensive calls block the window longer) or into the past (a
/// stamp older than the window is dropped immediately, so negative costs
/// refund quota).
pub struct RateLimiter {
    config: RateLimitConfig,
    epoch: Instant,
    windows: Mutex<HashMap<u64, Vec<i64>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            epoch: Instant::now(),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Records a call for `identity` and reports whether it is within
    /// budget. The call is recorded either way; a denied caller keeps
    /// burning quota by retrying.
    pub fn check(&self, identity: u64) -> bool {
        self.check_with_cost(identity, 0.0)
    }

    /// Like [`check`](Self::check), with the stamp shifted by `cost`
    /// seconds.
    pub fn check_with_cost(&self, identity: u64, cost: f64) -> bool {
        self.check_at(identity, cost, self.now())
    }

    /// [`check`](Self::check) as a guard clause: `?` short-circuits a
    /// request handler with [`RenderError::QuotaExceeded`] when the
    /// identity is out of budget.
    pub fn check_or_err(&self, identity: u64) -> Result<(), RenderError> {
        if self.check(identity) {
            Ok(())
        } else {
            Err(RenderError::QuotaExceeded)
        }
    }

    /// Core check against an explicit clock, in seconds since the
    /// limiter's epoch.
    fn check_at(&self, identity: u64, cost: f64, now_secs: f64) -> bool {
        let cutoff = to_decis(now_secs - self.config.window_secs);
        let mut windows = self.windows.lock();
        let stamps = windows.entry(identity).or_default();
        stamps.push(to_decis(now_secs + cost));
        stamps.retain(|&s| s > cutoff);
        let allowed = stamps.len() <= self.config.max_calls;
        if !allowed {
            debug!(identity, live = stamps.len(), "rate limit exceeded");
        }
        allowed
    }

    /// Calls left in the current window for `identity`.
    pub fn remaining(&self, identity: u64) -> usize {
        let cutoff = to_decis(self.now() - self.config.window_secs);
        let mut windows = self.windows.lock();
        let stamps = windows.entry(identity).or_default();
        stamps.retain(|&s| s > cutoff);
        self.config.max_calls.saturating_sub(stamps.len())
    }

    /// Seconds until a denied `identity` is allowed again; `None` when it
    /// is within budget right now.
    pub fn next_free_at(&self, identity: u64) -> Option<f64> {
        let now = self.now();
        let cutoff = to_decis(now - self.config.window_secs);
        let mut windows = self.windows.lock();
        let stamps = windows.entry(identity).or_default();
        stamps.retain(|&s| s > cutoff);
        if stamps.len() < self.config.max_calls {
            return None;
        }
        let oldest = *stamps.iter().min()?;
        Some((from_decis(oldest) + self.config.window_secs - now).max(0.0))
    }

    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

#[inline]
fn to_decis(secs: f64) -> i64 {
    (secs * 10.0).round() as i64
}

#[inline]
fn from_decis(stamp: i64) -> f64 {
    stamp as f64 / 10.0
}
