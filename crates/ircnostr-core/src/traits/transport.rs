// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport seam between the connection state machine and the wire client.
//!
//! The connection actor never touches a client library directly. A
//! [`TransportConnector`] opens sessions; each [`TransportSession`] carries a
//! stream of [`TransportEvent`]s and a [`TransportLink`] used to write
//! keep-alive probes and the final QUIT.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::TransportError;

/// Events surfaced by an open chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The server acknowledged registration (IRC 001).
    Registered { server: String },
    /// A chat line addressed to a channel or to us.
    Privmsg {
        sender: String,
        target: String,
        text: String,
    },
    /// The server closed the session (ERROR line or orderly EOF).
    Closed { reason: String },
}

/// Stream of events for one session; ends when the transport goes away.
pub type TransportEvents =
    Pin<Box<dyn Stream<Item = Result<TransportEvent, TransportError>> + Send>>;

/// Write half of an open session.
pub trait TransportLink: Send + Sync {
    /// Sends a liveness probe.
    fn probe(&self, token: &str) -> Result<(), TransportError>;

    /// Announces departure; the session is unusable afterwards.
    fn quit(&self, reason: &str) -> Result<(), TransportError>;
}

/// An open chat session.
pub struct TransportSession {
    pub link: Box<dyn TransportLink>,
    pub events: TransportEvents,
}

impl std::fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSession").finish_non_exhaustive()
    }
}

/// Opens chat sessions. Registration and channel join are sent as part of `open`.
#[async_trait]
pub trait TransportConnector: Send + Sync + 'static {
    /// Human-readable server address, for logs.
    fn endpoint(&self) -> String;

    async fn open(&self) -> Result<TransportSession, TransportError>;
}
