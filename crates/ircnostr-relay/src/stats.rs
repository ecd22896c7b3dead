// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cumulative engine counters shared with the status endpoint.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sentinel for "no activity yet" in `last_activity_ms`.
const NEVER: i64 = i64::MIN;

/// Counters written by the engine and read by the gateway.
///
/// Created once by the caller and handed to both by `Arc`.
#[derive(Debug)]
pub struct RelayStats {
    started: Instant,
    observed: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    last_activity_ms: AtomicI64,
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub messages_observed: u64,
    pub successful_publishes: u64,
    pub failed_publishes: u64,
    pub messages_dropped: u64,
    pub last_activity: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            observed: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            last_activity_ms: AtomicI64::new(NEVER),
        }
    }

    pub fn record_observed(&self, at: DateTime<Utc>) {
        self.observed.fetch_add(1, Ordering::Relaxed);
        self.last_activity_ms
            .store(at.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn record_publish(&self, delivered: bool) {
        let counter = if delivered {
            &self.successful
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A line the filter pipeline rejected.
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let last = self.last_activity_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            messages_observed: self.observed.load(Ordering::Relaxed),
            successful_publishes: self.successful.load(Ordering::Relaxed),
            failed_publishes: self.failed.load(Ordering::Relaxed),
            messages_dropped: self.dropped.load(Ordering::Relaxed),
            last_activity: (last != NEVER)
                .then(|| DateTime::from_timestamp_millis(last))
                .flatten(),
            uptime_secs: self.uptime_secs(),
        }
    }
}

impl StatsSnapshot {
    /// Lines whose handling has finished, relayed or not.
    pub fn messages_settled(&self) -> u64 {
        self.successful_publishes + self.failed_publishes + self.messages_dropped
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_are_zero() {
        let snapshot = RelayStats::new().snapshot();
        assert_eq!(snapshot.messages_observed, 0);
        assert_eq!(snapshot.successful_publishes, 0);
        assert_eq!(snapshot.failed_publishes, 0);
        assert_eq!(snapshot.messages_dropped, 0);
        assert!(snapshot.last_activity.is_none());
    }

    #[test]
    fn counters_accumulate() {
        let stats = RelayStats::new();
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        stats.record_observed(at);
        stats.record_observed(at);
        stats.record_publish(true);
        stats.record_publish(false);
        stats.record_publish(false);
        stats.record_dropped();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.messages_observed, 2);
        assert_eq!(snapshot.successful_publishes, 1);
        assert_eq!(snapshot.failed_publishes, 2);
        assert_eq!(snapshot.messages_dropped, 1);
        assert_eq!(snapshot.messages_settled(), 4);
        assert_eq!(snapshot.last_activity, Some(at));
    }
}
