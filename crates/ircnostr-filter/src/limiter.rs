// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-key sliding-window rate limiter.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Accepts at most `max` events per key within any trailing `window`.
///
/// Timestamps are supplied by the caller, which keeps the limiter
/// deterministic and independent of the wall clock. Windows are pruned
/// lazily on each check.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max: usize,
    window: TimeDelta,
    events: HashMap<String, VecDeque<DateTime<Utc>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            events: HashMap::new(),
        }
    }

    /// Records an event for `key` at `now` if the window has room.
    ///
    /// Returns `false` (and records nothing) when the key is over its limit.
    pub fn check(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let window = self.events.entry(key.to_string()).or_default();

        while let Some(&oldest) = window.front() {
            if now - oldest >= self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.max {
            return false;
        }
        window.push_back(now);
        true
    }

    /// Events currently counted against `key`, without pruning.
    pub fn in_window(&self, key: &str) -> usize {
        self.events.get(key).map_or(0, VecDeque::len)
    }
}
