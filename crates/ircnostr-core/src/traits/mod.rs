// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter and seam trait definitions.
//!
//! All async traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod sink;
pub mod transport;

pub use adapter::PluginAdapter;
pub use sink::RelaySink;
pub use transport::{
    TransportConnector, TransportEvent, TransportEvents, TransportLink, TransportSession,
};
