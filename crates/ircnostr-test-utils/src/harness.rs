// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end harness: a real `RelayEngine` wired to mock transports.
//!
//! The chat side is a [`MockConnector`], the relay side a [`MockRelaySink`].
//! Everything between them (connection actor, filter pipeline, signing,
//! fan-out, stats) is the production code.

use std::sync::Arc;
use std::time::Duration;

use ircnostr_core::error::BridgeError;
use ircnostr_core::types::ConnectionState;
use ircnostr_filter::RelayFilterPipeline;
use ircnostr_irc::{ChannelConnection, ConnectionSettings};
use ircnostr_nostr::{FanoutPublisher, SigningKeys};
use ircnostr_relay::{RelayEngine, RelayStats};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::mock_sink::MockRelaySink;
use crate::mock_transport::{MockConnector, MockSession};

/// Well-known test key (NIP-19 example vector).
pub const TEST_SECRET_KEY: &str =
    "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    target_sender: String,
    channel: String,
    relays: Vec<String>,
    failing_relays: Vec<String>,
    dry_run: bool,
    rate_limit_max: usize,
    rate_limit_window: Duration,
    settings: ConnectionSettings,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            target_sender: "BlockBot".into(),
            channel: "#blocks".into(),
            relays: (0..5).map(|i| format!("wss://relay{i}.test")).collect(),
            failing_relays: Vec::new(),
            dry_run: false,
            rate_limit_max: 5,
            rate_limit_window: Duration::from_secs(60),
            settings: ConnectionSettings::default(),
        }
    }

    pub fn with_target(mut self, sender: &str, channel: &str) -> Self {
        self.target_sender = sender.into();
        self.channel = channel.into();
        self
    }

    pub fn with_relays(mut self, relays: Vec<String>) -> Self {
        self.relays = relays;
        self
    }

    /// Makes the mock sink reject every delivery to `relay`.
    pub fn with_failing_relay(mut self, relay: &str) -> Self {
        self.failing_relays.push(relay.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_rate_limit(mut self, max: usize, window: Duration) -> Self {
        self.rate_limit_max = max;
        self.rate_limit_window = window;
        self
    }

    pub fn with_connection_settings(mut self, settings: ConnectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Spawns the engine and waits until the mock server has registered it.
    pub async fn build(self) -> Result<TestHarness, BridgeError> {
        let connector = Arc::new(MockConnector::new());
        let sink = MockRelaySink::new();
        for relay in &self.failing_relays {
            sink.fail_relay(relay).await;
        }

        let shutdown = CancellationToken::new();
        let stats = Arc::new(RelayStats::new());
        let connection = Arc::new(ChannelConnection::spawn(
            connector.clone(),
            self.settings,
            shutdown.clone(),
        ));
        let pipeline = RelayFilterPipeline::new(
            self.target_sender,
            self.channel,
            self.rate_limit_max,
            self.rate_limit_window,
        );
        let publisher = Arc::new(FanoutPublisher::new(
            SigningKeys::parse(TEST_SECRET_KEY)?,
            self.relays,
            Arc::new(sink.clone()),
            self.dry_run,
        ));

        let engine = RelayEngine::new(
            connection.clone(),
            pipeline,
            publisher.clone(),
            stats.clone(),
            shutdown.clone(),
        );
        let engine = tokio::spawn(engine.run());

        let session = connector.wait_for_sessions(1).await;
        session.register();
        let mut state = connection.watch();
        state
            .wait_for(|s| s.state == ConnectionState::Registered)
            .await
            .map_err(|_| BridgeError::Internal("connection actor stopped".into()))?;

        Ok(TestHarness {
            connector,
            sink,
            connection,
            publisher,
            stats,
            shutdown,
            engine: Some(engine),
        })
    }
}

/// A running engine with handles to both of its mock ends.
pub struct TestHarness {
    pub connector: Arc<MockConnector>,
    pub sink: MockRelaySink,
    pub connection: Arc<ChannelConnection>,
    pub publisher: Arc<FanoutPublisher>,
    pub stats: Arc<RelayStats>,
    pub shutdown: CancellationToken,
    engine: Option<JoinHandle<Result<(), BridgeError>>>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The most recently opened chat session.
    pub fn session(&self) -> MockSession {
        self.connector
            .latest_session()
            .expect("harness always has an open session")
    }

    /// Injects a chat line and waits until the engine has fully handled it.
    pub async fn say(&self, sender: &str, channel: &str, text: &str) {
        let target = self.stats.snapshot().messages_observed + 1;
        self.session().privmsg(sender, channel, text);
        self.wait_for_settled(target).await;
    }

    /// Waits until `count` lines have been observed and fully handled.
    pub async fn wait_for_settled(&self, count: u64) {
        tokio::time::timeout(Duration::from_secs(30), async {
            loop {
                let snapshot = self.stats.snapshot();
                if snapshot.messages_observed >= count && snapshot.messages_settled() >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("engine did not process the message in time");
    }

    /// Cancels the engine and waits for it to finish.
    pub async fn stop(&mut self) -> Result<(), BridgeError> {
        self.shutdown.cancel();
        match self.engine.take() {
            Some(handle) => handle
                .await
                .map_err(|e| BridgeError::Internal(format!("engine task panicked: {e}")))?,
            None => Ok(()),
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
