// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiting.
//!
//! One counter implementation, parameterized over where window state lives:
//! - [`MemoryStore`]: process-wide table for the HTTP server
//! - [`crate::throttle::FileStore`]: durable file for the serverless path
//!
//! A window opens on the first request from a key and admits up to
//! `max_requests` until `reset_at`. The first request at or after `reset_at`
//! opens a fresh window with a count of 1. Up to `2 * max_requests` requests
//! can therefore land around a window seam.

use crate::config::RateLimitConfig;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Counter state for one caller key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub count: u32,
    #[serde(rename = "resetTime", with = "chrono::serde::ts_milliseconds")]
    pub reset_at: DateTime<Utc>,
}

impl WindowState {
    fn open(now: DateTime<Utc>, window: Duration) -> Self {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        Self {
            count: 1,
            reset_at: now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the current window closes
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Storage backend for window state.
pub trait WindowStore: Send + Sync {
    /// Run `f` on the stored state for `key` as one atomic read-modify-write.
    ///
    /// `f` returns the replacement state (`None` leaves storage untouched)
    /// and a value passed back to the caller. Unreadable state is handed to
    /// `f` as `None`.
    fn update<R, F>(&self, key: &str, f: F) -> R
    where
        F: FnOnce(Option<WindowState>) -> (Option<WindowState>, R);

    /// Drop every window that has closed by `now`. Returns the number dropped.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

/// In-process window table. Entry access locks one shard, so a single key is
/// checked and updated atomically while other keys proceed in parallel.
#[derive(Debug, Default)]
pub struct MemoryStore {
    windows: DashMap<String, WindowState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<WindowState> {
        self.windows.get(key).map(|entry| *entry)
    }
}

impl WindowStore for MemoryStore {
    fn update<R, F>(&self, key: &str, f: F) -> R
    where
        F: FnOnce(Option<WindowState>) -> (Option<WindowState>, R),
    {
        match self.windows.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let (next, out) = f(Some(*entry.get()));
                if let Some(state) = next {
                    entry.insert(state);
                }
                out
            }
            Entry::Vacant(entry) => {
                let (next, out) = f(None);
                if let Some(state) = next {
                    entry.insert(state);
                }
                out
            }
        }
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, state| !state.is_expired(now));
        before.saturating_sub(self.windows.len())
    }
}

/// Fixed-window counter over any [`WindowStore`].
#[derive(Debug, Default)]
pub struct FixedWindowLimiter<S> {
    store: S,
}

impl<S: WindowStore> FixedWindowLimiter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check and count a request from `key` at the current time.
    pub fn check(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitResult {
        self.check_at(key, max_requests, window, Utc::now())
    }

    /// Check and count a request from `key` at `now`.
    ///
    /// A limited request leaves the stored state unchanged.
    pub fn check_at(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitResult {
        self.store.update(key, |current| match current {
            Some(state) if !state.is_expired(now) => {
                if state.count < max_requests {
                    let next = WindowState {
                        count: state.count + 1,
                        reset_at: state.reset_at,
                    };
                    let result = RateLimitResult::Allowed {
                        remaining: max_requests - next.count,
                        reset_in: until(now, next.reset_at),
                    };
                    (Some(next), result)
                } else {
                    let retry_after = until(now, state.reset_at);
                    debug!(key, count = state.count, ?retry_after, "Window exhausted");
                    (None, RateLimitResult::Limited { retry_after })
                }
            }
            _ => {
                let fresh = WindowState::open(now, window);
                let result = RateLimitResult::Allowed {
                    remaining: max_requests.saturating_sub(1),
                    reset_in: window,
                };
                (Some(fresh), result)
            }
        })
    }

    /// Boolean form of [`Self::check`].
    pub fn allow(&self, key: &str, max_requests: u32, window: Duration) -> bool {
        self.check(key, max_requests, window).is_allowed()
    }

    /// Boolean form of [`Self::check_at`].
    pub fn allow_at(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        self.check_at(key, max_requests, window, now).is_allowed()
    }
}

fn until(now: DateTime<Utc>, later: DateTime<Utc>) -> Duration {
    (later - now).to_std().unwrap_or(Duration::ZERO)
}

/// Server-side limiter keyed by client address.
pub struct RateLimiter {
    config: RateLimitConfig,
    inner: FixedWindowLimiter<MemoryStore>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            inner: FixedWindowLimiter::new(MemoryStore::new()),
        }
    }

    /// Check the configured limit for `key`.
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Utc::now())
    }

    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitResult {
        self.inner.check_at(
            key,
            self.config.max_requests,
            self.config.window_duration(),
            now,
        )
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.inner.store().len()
    }

    /// Drop closed windows (should be called periodically).
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now())
    }

    pub fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let purged = self.inner.store().purge_expired(now);
        if purged > 0 {
            debug!(purged, remaining = self.tracked_keys(), "Purged closed windows");
        }
        purged
    }
}
