// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent fan-out of one post to every configured relay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use ircnostr_config::model::NostrConfig;
use ircnostr_core::error::BridgeError;
use ircnostr_core::traits::{PluginAdapter, RelaySink};
use ircnostr_core::types::{
    AdapterType, EndpointResult, HealthStatus, OutboundPost, PublishOutcome,
};
use tracing::{debug, info, warn};

use crate::event::sign_post;
use crate::keys::SigningKeys;
use crate::sink::WebSocketRelaySink;

/// Signs a post once and delivers it to all relays independently.
///
/// `publish` never fails as a whole: every relay failure is isolated into
/// its [`EndpointResult`]. Whether an outcome with zero successes counts as
/// a failed publish is the caller's decision.
pub struct FanoutPublisher {
    keys: SigningKeys,
    relays: Vec<String>,
    sink: Arc<dyn RelaySink>,
    dry_run: bool,
}

impl FanoutPublisher {
    pub fn new(
        keys: SigningKeys,
        relays: Vec<String>,
        sink: Arc<dyn RelaySink>,
        dry_run: bool,
    ) -> Self {
        Self {
            keys,
            relays,
            sink,
            dry_run,
        }
    }

    /// Production publisher: WebSocket sink with the configured per-relay timeout.
    pub fn from_config(config: &NostrConfig) -> Result<Self, BridgeError> {
        let secret = config
            .secret_key
            .as_deref()
            .ok_or_else(|| BridgeError::Config("nostr.secret_key is required".into()))?;
        let keys = SigningKeys::parse(secret)?;
        let sink = WebSocketRelaySink::new(Duration::from_secs(config.publish_timeout_secs));
        Ok(Self::new(
            keys,
            config.relays.clone(),
            Arc::new(sink),
            config.dry_run,
        ))
    }

    pub async fn publish(&self, post: &OutboundPost) -> PublishOutcome {
        if self.dry_run {
            info!(
                content = %post.rendered_content(),
                relays = ?self.relays,
                "dry run, not publishing"
            );
            return PublishOutcome::from_results(
                self.relays.iter().map(EndpointResult::ok).collect(),
            );
        }

        let event = match sign_post(post, &self.keys) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "could not sign post");
                let reason = e.to_string();
                return PublishOutcome::from_results(
                    self.relays
                        .iter()
                        .map(|relay| EndpointResult::failed(relay, reason.clone()))
                        .collect(),
                );
            }
        };

        let deliveries = self.relays.iter().map(|relay| {
            let event = &event;
            async move {
                match self.sink.deliver(relay, event).await {
                    Ok(()) => {
                        debug!(relay, event_id = %event.id, "relay accepted event");
                        EndpointResult::ok(relay)
                    }
                    Err(e) => {
                        warn!(relay, error = %e, "relay delivery failed");
                        EndpointResult::failed(relay, e.to_string())
                    }
                }
            }
        });
        let outcome = PublishOutcome::from_results(join_all(deliveries).await);

        info!(
            event_id = %event.id,
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "publish finished"
        );
        outcome
    }

    pub fn relays(&self) -> &[String] {
        &self.relays
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn public_key_hex(&self) -> &str {
        self.keys.public_key_hex()
    }
}

#[async_trait]
impl PluginAdapter for FanoutPublisher {
    fn name(&self) -> &str {
        "nostr"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Publisher
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        if self.relays.is_empty() {
            return Ok(HealthStatus::Unhealthy("no relays configured".into()));
        }
        if self.dry_run {
            return Ok(HealthStatus::Degraded("dry run".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        // Relay connections are scoped to a single delivery.
        Ok(())
    }
}
