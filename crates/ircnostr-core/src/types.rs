// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the connection, filter, publisher and gateway.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role of an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Publisher,
    Observability,
}

/// Connectivity of the chat connection.
///
/// Owned by the connection actor; everyone else reads snapshots.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    /// Registered with the server and joined.
    Registered,
    Closing,
}

/// A chat line observed on the connection, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub sender: String,
    pub channel: String,
    pub raw_text: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(
        sender: impl Into<String>,
        channel: impl Into<String>,
        raw_text: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sender: sender.into(),
            channel: channel.into(),
            raw_text: raw_text.into(),
            received_at,
        }
    }
}

/// Why the filter accepted or dropped a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    NotTargetSender,
    NotTargetChannel,
    RateLimited,
    EmptyAfterSanitize,
    Approved,
}

/// Per-message filter verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayDecision {
    pub approved: bool,
    pub reason: DecisionReason,
}

impl RelayDecision {
    pub fn approve() -> Self {
        Self {
            approved: true,
            reason: DecisionReason::Approved,
        }
    }

    pub fn reject(reason: DecisionReason) -> Self {
        Self {
            approved: false,
            reason,
        }
    }
}

/// A sanitized post ready to be signed and fanned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPost {
    /// Sanitized text, at most 280 characters.
    pub content: String,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl OutboundPost {
    /// Text as it appears on the wire: the content followed by one hashtag per tag.
    pub fn rendered_content(&self) -> String {
        let mut out = self.content.clone();
        for tag in &self.tags {
            out.push_str(" #");
            out.push_str(tag);
        }
        out
    }
}

/// A signed NIP-01 event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvent {
    /// Lowercase hex sha256 of the canonical serialization.
    pub id: String,
    /// Lowercase hex x-only public key.
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    /// Lowercase hex Schnorr signature.
    pub sig: String,
}

/// Result of one relay delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointResult {
    pub endpoint: String,
    pub success: bool,
    pub error: Option<String>,
}

impl EndpointResult {
    pub fn ok(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(endpoint: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of one fan-out publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<EndpointResult>,
}

impl PublishOutcome {
    pub fn from_results(results: Vec<EndpointResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            attempted: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// A publish counts as delivered when at least one relay accepted it.
    pub fn is_delivered(&self) -> bool {
        self.succeeded > 0
    }
}
