// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the ircnostr bridge.

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid TOML, missing signing key, bad relay URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// Chat transport errors (refused, reset, protocol faults).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A single relay failed to accept a post.
    #[error("publish to {endpoint} failed: {message}")]
    Publish { endpoint: String, message: String },

    /// Key parsing or event signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Closed classification of chat transport failures.
///
/// Produced at the transport boundary so that recovery is decided on the
/// kind, never on the text of an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// The server refused the TCP connection.
    ConnectionRefused,
    /// The connection was reset, aborted, or hit EOF.
    ConnectionReset,
    /// A connect, read, or ping deadline elapsed.
    Timeout,
    /// TLS handshake or certificate failure.
    Tls,
    /// Malformed or missing protocol data surfaced by the client library.
    Protocol,
    /// Any other I/O failure.
    Io,
    /// A failure the transport could not place in any of the above.
    Unclassified,
}

impl TransportErrorKind {
    /// Whether the connection should recover from this kind by reconnecting.
    ///
    /// Unclassified faults escalate to a graceful shutdown instead.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, TransportErrorKind::Unclassified)
    }
}

/// A classified chat transport failure.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a raw I/O error by its [`std::io::ErrorKind`].
    pub fn from_io(err: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        let kind = match err.kind() {
            ErrorKind::ConnectionRefused => TransportErrorKind::ConnectionRefused,
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof => TransportErrorKind::ConnectionReset,
            ErrorKind::TimedOut => TransportErrorKind::Timeout,
            _ => TransportErrorKind::Io,
        };
        Self::new(kind, err.to_string())
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}
