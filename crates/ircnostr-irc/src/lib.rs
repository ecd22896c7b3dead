// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IRC channel connection for the ircnostr bridge.
//!
//! [`ChannelConnection`] keeps one registered session to a chat server alive,
//! reconnecting with a fixed delay up to a configured attempt limit, and
//! broadcasts every received chat line to its listeners. The wire side is
//! pluggable through [`TransportConnector`](ircnostr_core::TransportConnector);
//! [`IrcConnector`] is the production implementation.

pub mod connection;
pub mod transport;

pub use connection::{ChannelConnection, ConnectionSettings, ConnectionSnapshot};
pub use transport::IrcConnector;
