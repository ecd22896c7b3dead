// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The relay loop.
//!
//! Subscribes to the chat connection, connects it, then feeds every observed
//! line through the filter pipeline and publishes approved posts one at a
//! time, so outcomes are produced in message arrival order.

use std::sync::Arc;
use std::time::Instant;

use ircnostr_core::error::BridgeError;
use ircnostr_core::types::{ConnectionState, IncomingMessage, PublishOutcome};
use ircnostr_filter::RelayFilterPipeline;
use ircnostr_irc::ChannelConnection;
use ircnostr_nostr::FanoutPublisher;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::recording;
use crate::stats::RelayStats;

pub struct RelayEngine {
    connection: Arc<ChannelConnection>,
    pipeline: RelayFilterPipeline,
    publisher: Arc<FanoutPublisher>,
    stats: Arc<RelayStats>,
    shutdown: CancellationToken,
}

impl RelayEngine {
    pub fn new(
        connection: Arc<ChannelConnection>,
        pipeline: RelayFilterPipeline,
        publisher: Arc<FanoutPublisher>,
        stats: Arc<RelayStats>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connection,
            pipeline,
            publisher,
            stats,
            shutdown,
        }
    }

    /// Runs until the shutdown token is cancelled, then closes the connection.
    pub async fn run(mut self) -> Result<(), BridgeError> {
        // Subscribe before connecting so no early line is missed.
        let mut messages = self.connection.subscribe();
        let mut snapshots = self.connection.watch();
        self.connection.connect().await?;
        info!(endpoint = self.connection.endpoint(), "relay engine started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                received = messages.recv() => match received {
                    Ok(message) => {
                        self.handle_message(message).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "engine fell behind, chat lines dropped");
                    }
                    Err(RecvError::Closed) => {
                        error!("chat message stream closed unexpectedly");
                        break;
                    }
                },
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        error!("connection state channel closed");
                        break;
                    }
                    let registered =
                        snapshots.borrow_and_update().state == ConnectionState::Registered;
                    recording::set_connection_registered(registered);
                }
            }
        }

        info!("relay engine stopping");
        if let Err(e) = self.connection.disconnect("ircnostr shutting down").await {
            warn!(error = %e, "chat connection did not close cleanly");
        }
        recording::set_connection_registered(false);
        Ok(())
    }

    /// Filters one line and publishes it when approved.
    ///
    /// Returns the publish outcome, or `None` when the line was dropped.
    pub async fn handle_message(&mut self, message: IncomingMessage) -> Option<PublishOutcome> {
        self.stats.record_observed(message.received_at);
        recording::record_observed();

        let verdict = self.pipeline.evaluate(&message);
        recording::record_decision(verdict.decision.reason);
        let Some(post) = verdict.post else {
            self.stats.record_dropped();
            debug!(
                sender = %message.sender,
                channel = %message.channel,
                reason = %verdict.decision.reason,
                "message not relayed"
            );
            return None;
        };

        let started = Instant::now();
        let outcome = self.publisher.publish(&post).await;
        for result in &outcome.results {
            recording::record_endpoint_result(result.success);
        }
        let delivered = outcome.is_delivered();
        recording::record_publish(delivered, started.elapsed().as_secs_f64());
        self.stats.record_publish(delivered);

        if delivered {
            info!(
                succeeded = outcome.succeeded,
                attempted = outcome.attempted,
                "post relayed"
            );
        } else {
            error!(
                attempted = outcome.attempted,
                errors = ?outcome.results.iter().filter_map(|r| r.error.as_deref()).collect::<Vec<_>>(),
                "post reached no relay"
            );
        }
        Some(outcome)
    }

    pub fn stats(&self) -> Arc<RelayStats> {
        self.stats.clone()
    }
}
