// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only HTTP surface of a running bridge.
//!
//! Serves `/health`, `/status` and `/metrics`. Handlers never touch the
//! engine directly: they read the shared [`RelayStats`](ircnostr_relay::RelayStats),
//! the connection snapshot channel, and facts fixed at startup.

pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, BridgeFacts, GatewayState, ServerConfig};
