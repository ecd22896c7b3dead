// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of a signed event to a single broadcast endpoint.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::types::SignedEvent;

/// Delivers one signed event to one relay.
///
/// Implementations own the whole connection scope: connect, submit, and
/// release the connection on every path.
#[async_trait]
pub trait RelaySink: Send + Sync + 'static {
    async fn deliver(&self, relay: &str, event: &SignedEvent) -> Result<(), BridgeError>;
}
