// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay engine for the ircnostr bridge.
//!
//! [`RelayEngine`] owns the filter pipeline and drives chat lines from the
//! [`ChannelConnection`](ircnostr_irc::ChannelConnection) to the
//! [`FanoutPublisher`](ircnostr_nostr::FanoutPublisher). [`RelayStats`] is
//! the explicit counter context shared with the status endpoint.

pub mod engine;
pub mod shutdown;
pub mod stats;

#[cfg(feature = "prometheus")]
use ircnostr_prometheus::recording;

/// Metric recording compiled out when the `prometheus` feature is off.
#[cfg(not(feature = "prometheus"))]
mod recording {
    use ircnostr_core::types::DecisionReason;

    pub fn record_observed() {}
    pub fn record_decision(_reason: DecisionReason) {}
    pub fn record_publish(_delivered: bool, _seconds: f64) {}
    pub fn record_endpoint_result(_success: bool) {}
    pub fn set_connection_registered(_registered: bool) {}
}

pub use engine::RelayEngine;
pub use shutdown::install_signal_handler;
pub use stats::{RelayStats, StatsSnapshot};
