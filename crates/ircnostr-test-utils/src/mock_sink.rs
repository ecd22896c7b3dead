// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock relay sink that records deliveries and fails chosen relays.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ircnostr_core::error::BridgeError;
use ircnostr_core::traits::RelaySink;
use ircnostr_core::types::SignedEvent;
use tokio::sync::Mutex;

/// A [`RelaySink`] that captures every delivery for assertion.
///
/// Relays listed with [`fail_relay`](Self::fail_relay) reject the event;
/// relays listed with [`hang_relay`](Self::hang_relay) never answer within
/// `hang_for`, which lets callers exercise their timeouts.
#[derive(Clone, Default)]
pub struct MockRelaySink {
    delivered: Arc<Mutex<Vec<(String, SignedEvent)>>>,
    calls: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    hanging: Arc<Mutex<HashSet<String>>>,
    hang_for: Duration,
}

impl MockRelaySink {
    pub fn new() -> Self {
        Self {
            hang_for: Duration::from_secs(3600),
            ..Self::default()
        }
    }

    pub async fn fail_relay(&self, relay: &str) {
        self.failing.lock().await.insert(relay.to_string());
    }

    pub async fn hang_relay(&self, relay: &str) {
        self.hanging.lock().await.insert(relay.to_string());
    }

    /// Relays that accepted an event, with the event they accepted.
    pub async fn delivered(&self) -> Vec<(String, SignedEvent)> {
        self.delivered.lock().await.clone()
    }

    /// Every relay `deliver` was called for, accepted or not.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl RelaySink for MockRelaySink {
    async fn deliver(&self, relay: &str, event: &SignedEvent) -> Result<(), BridgeError> {
        self.calls.lock().await.push(relay.to_string());

        if self.hanging.lock().await.contains(relay) {
            tokio::time::sleep(self.hang_for).await;
        }
        if self.failing.lock().await.contains(relay) {
            return Err(BridgeError::Publish {
                endpoint: relay.to_string(),
                message: "blocked: mock relay rejects everything".into(),
            });
        }

        self.delivered
            .lock()
            .await
            .push((relay.to_string(), event.clone()));
        Ok(())
    }
}
