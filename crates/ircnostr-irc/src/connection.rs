// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconnecting channel connection.
//!
//! A single actor task owns the transport session, the in-flight open, the
//! keep-alive timer and the pending reconnect timer. The public [`ChannelConnection`] handle talks
//! to it over a command channel and reads a [`ConnectionSnapshot`] through a
//! watch channel, so the state machine is never mutated from two places.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use ircnostr_config::model::IrcConfig;
use ircnostr_core::error::{BridgeError, TransportError, TransportErrorKind};
use ircnostr_core::traits::{PluginAdapter, TransportConnector, TransportEvent, TransportSession};
use ircnostr_core::types::{AdapterType, ConnectionState, HealthStatus, IncomingMessage};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of the listener broadcast; slow listeners lag instead of blocking.
const MESSAGE_BUFFER: usize = 256;

/// How long a closing session may take to flush its QUIT line.
const QUIT_FLUSH: Duration = Duration::from_secs(2);

/// An open in progress, bounded by the connect timeout.
type PendingOpen = Pin<Box<dyn Future<Output = Result<TransportSession, TransportError>> + Send>>;

/// Timing and retry parameters of a [`ChannelConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub keepalive: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub connect_timeout: Duration,
}

impl ConnectionSettings {
    pub fn from_config(config: &IrcConfig) -> Self {
        Self {
            keepalive: Duration::from_secs(config.keepalive_secs),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            max_reconnect_attempts: config.max_reconnect_attempts,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from_config(&IrcConfig::default())
    }
}

/// Point-in-time view of the connection, published on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    /// Consecutive reconnect attempts since the last successful registration.
    pub reconnect_attempts: u32,
    /// Set once the attempt limit is reached; cleared by a manual connect.
    pub retries_exhausted: bool,
    pub last_error: Option<String>,
}

enum Command {
    Connect,
    Disconnect {
        reason: String,
        done: oneshot::Sender<()>,
    },
}

/// Handle to the connection actor.
///
/// Cloning is not supported; share it behind an `Arc`.
pub struct ChannelConnection {
    endpoint: String,
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<ConnectionSnapshot>,
    messages: broadcast::Sender<IncomingMessage>,
}

impl ChannelConnection {
    /// Spawns the actor task. Nothing is opened until [`connect`](Self::connect).
    ///
    /// `escalate` is cancelled when the transport reports a fault it cannot
    /// classify; the owner is expected to treat that as a shutdown request.
    pub fn spawn(
        connector: Arc<dyn TransportConnector>,
        settings: ConnectionSettings,
        escalate: CancellationToken,
    ) -> Self {
        let endpoint = connector.endpoint();
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(ConnectionSnapshot::default());
        let (messages_tx, _) = broadcast::channel(MESSAGE_BUFFER);

        let actor = ConnectionActor {
            connector,
            settings,
            snapshot: snapshot_tx,
            messages: messages_tx.clone(),
            escalate,
            session: None,
            opening: None,
            keepalive: None,
            reconnect: None,
            attempts: 0,
            probe_seq: 0,
            inert: false,
        };
        tokio::spawn(actor.run(commands_rx));

        Self {
            endpoint,
            commands: commands_tx,
            snapshot: snapshot_rx,
            messages: messages_tx,
        }
    }

    /// Registers a listener for every chat line received from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<IncomingMessage> {
        self.messages.subscribe()
    }

    /// Opens the transport. Returns once the request is queued; progress is
    /// observable through [`watch`](Self::watch).
    pub async fn connect(&self) -> Result<(), BridgeError> {
        self.commands
            .send(Command::Connect)
            .await
            .map_err(|_| BridgeError::Internal("connection task has stopped".into()))
    }

    /// Sends QUIT, cancels all timers and leaves the connection inert.
    ///
    /// Completes after the actor has finished closing.
    pub async fn disconnect(&self, reason: &str) -> Result<(), BridgeError> {
        let (done, acked) = oneshot::channel();
        self.commands
            .send(Command::Disconnect {
                reason: reason.to_string(),
                done,
            })
            .await
            .map_err(|_| BridgeError::Internal("connection task has stopped".into()))?;
        acked
            .await
            .map_err(|_| BridgeError::Internal("connection task dropped disconnect".into()))
    }

    pub fn state(&self) -> ConnectionState {
        self.snapshot.borrow().state
    }

    /// True while registered with the server.
    pub fn is_active(&self) -> bool {
        self.state() == ConnectionState::Registered
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.snapshot.clone()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PluginAdapter for ChannelConnection {
    fn name(&self) -> &str {
        "irc"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BridgeError> {
        let snapshot = self.snapshot();
        Ok(match snapshot.state {
            ConnectionState::Registered => HealthStatus::Healthy,
            ConnectionState::Connecting => HealthStatus::Degraded("registering".into()),
            _ if snapshot.retries_exhausted => {
                HealthStatus::Unhealthy("reconnect attempts exhausted".into())
            }
            state => HealthStatus::Unhealthy(format!("connection is {state}")),
        })
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        self.disconnect("shutting down").await
    }
}

struct ConnectionActor {
    connector: Arc<dyn TransportConnector>,
    settings: ConnectionSettings,
    snapshot: watch::Sender<ConnectionSnapshot>,
    messages: broadcast::Sender<IncomingMessage>,
    escalate: CancellationToken,
    session: Option<TransportSession>,
    /// Dropped by [`close`](Self::close), so a disconnect never waits on it.
    opening: Option<PendingOpen>,
    keepalive: Option<Interval>,
    reconnect: Option<Pin<Box<Sleep>>>,
    attempts: u32,
    probe_seq: u64,
    /// No reconnects are scheduled while set; cleared by a manual connect.
    inert: bool,
}

impl ConnectionActor {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Connect) => {
                        self.inert = false;
                        self.snapshot.send_modify(|s| s.retries_exhausted = false);
                        self.connect();
                    }
                    Some(Command::Disconnect { reason, done }) => {
                        self.close(&reason).await;
                        let _ = done.send(());
                    }
                    None => {
                        self.close("connection handle dropped").await;
                        break;
                    }
                },
                opened = finish_open(&mut self.opening) => {
                    self.opening = None;
                    self.on_opened(opened);
                }
                event = next_event(&mut self.session) => self.on_event(event),
                _ = tick(&mut self.keepalive) => self.on_keepalive(),
                _ = expire(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.on_reconnect_due();
                }
            }
        }
        debug!("connection actor stopped");
    }

    fn state(&self) -> ConnectionState {
        self.snapshot.borrow().state
    }

    fn set_state(&self, state: ConnectionState) {
        self.snapshot.send_modify(|s| s.state = state);
    }

    fn connect(&mut self) {
        match self.state() {
            ConnectionState::Registered | ConnectionState::Connecting => {
                debug!(state = %self.state(), "connect ignored, session already open");
                return;
            }
            ConnectionState::Disconnected | ConnectionState::Closing => {}
        }

        self.drop_session();
        self.set_state(ConnectionState::Connecting);
        info!(
            server = %self.connector.endpoint(),
            attempt = self.attempts,
            "opening chat connection"
        );

        let connector = self.connector.clone();
        let timeout = self.settings.connect_timeout;
        self.opening = Some(Box::pin(async move {
            tokio::time::timeout(timeout, connector.open())
                .await
                .unwrap_or_else(|_| {
                    Err(TransportError::new(
                        TransportErrorKind::Timeout,
                        format!("connect timed out after {timeout:?}"),
                    ))
                })
        }));
    }

    fn on_opened(&mut self, opened: Result<TransportSession, TransportError>) {
        match opened {
            Ok(session) => {
                debug!("transport open, awaiting registration");
                self.session = Some(session);
            }
            Err(err) => self.on_fault(err),
        }
    }

    fn on_event(&mut self, event: Option<Result<TransportEvent, TransportError>>) {
        match event {
            Some(Ok(TransportEvent::Registered { server })) => self.on_registered(&server),
            Some(Ok(TransportEvent::Privmsg {
                sender,
                target,
                text,
            })) => {
                let message = IncomingMessage::new(sender, target, text, Utc::now());
                if self.messages.send(message).is_err() {
                    debug!("no listeners, dropping chat line");
                }
            }
            Some(Ok(TransportEvent::Closed { reason })) => {
                self.on_fault(TransportError::new(TransportErrorKind::ConnectionReset, reason));
            }
            Some(Err(err)) => self.on_fault(err),
            None => self.on_fault(TransportError::new(
                TransportErrorKind::ConnectionReset,
                "event stream ended",
            )),
        }
    }

    fn on_registered(&mut self, server: &str) {
        if self.state() != ConnectionState::Connecting {
            debug!(state = %self.state(), "ignoring late registration");
            return;
        }
        info!(server, after_attempts = self.attempts, "registered with chat server");
        self.attempts = 0;
        self.snapshot.send_modify(|s| {
            s.state = ConnectionState::Registered;
            s.reconnect_attempts = 0;
            s.retries_exhausted = false;
            s.last_error = None;
        });

        let period = self.settings.keepalive;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.keepalive = Some(interval);
    }

    fn on_keepalive(&mut self) {
        let Some(session) = &self.session else {
            self.keepalive = None;
            return;
        };
        self.probe_seq += 1;
        let token = format!("ircnostr-{}", self.probe_seq);
        match session.link.probe(&token) {
            Ok(()) => debug!(token, "keep-alive sent"),
            Err(err) => {
                warn!(error = %err, "keep-alive probe failed");
                self.on_fault(err);
            }
        }
    }

    fn on_reconnect_due(&mut self) {
        if self.state() == ConnectionState::Registered {
            debug!("connection recovered before reconnect fired, skipping");
            return;
        }
        self.connect();
    }

    /// Handles any loss of the transport, whether during connect or later.
    fn on_fault(&mut self, err: TransportError) {
        self.drop_session();
        self.snapshot.send_modify(|s| {
            s.state = ConnectionState::Disconnected;
            s.last_error = Some(err.to_string());
        });

        if !err.is_recoverable() {
            error!(error = %err, "unclassified transport fault, requesting shutdown");
            self.inert = true;
            self.reconnect = None;
            self.escalate.cancel();
            return;
        }

        warn!(kind = %err.kind, error = %err.message, "chat connection lost");
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if self.inert {
            return;
        }
        if self.reconnect.is_some() {
            debug!("reconnect already pending");
            return;
        }
        let max = self.settings.max_reconnect_attempts;
        if self.attempts >= max {
            error!(
                attempts = self.attempts,
                "reconnect attempts exhausted, giving up until restarted"
            );
            self.snapshot.send_modify(|s| s.retries_exhausted = true);
            return;
        }

        self.attempts += 1;
        let attempt = self.attempts;
        self.snapshot.send_modify(|s| s.reconnect_attempts = attempt);
        warn!(
            attempt,
            max,
            delay = ?self.settings.reconnect_delay,
            "scheduling reconnect"
        );
        self.reconnect = Some(Box::pin(tokio::time::sleep(self.settings.reconnect_delay)));
    }

    async fn close(&mut self, reason: &str) {
        self.set_state(ConnectionState::Closing);
        self.inert = true;
        self.opening = None;
        self.reconnect = None;
        self.keepalive = None;
        self.attempts = 0;

        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.link.quit(reason) {
                debug!(error = %err, "QUIT could not be queued");
            }
            // Drive the stream so the QUIT line reaches the wire before the socket drops.
            let _ = tokio::time::timeout(QUIT_FLUSH, async {
                while session.events.next().await.is_some() {}
            })
            .await;
        }
        info!(reason, "chat connection closed");
        self.snapshot.send_modify(|s| s.reconnect_attempts = 0);
    }

    fn drop_session(&mut self) {
        self.session = None;
        self.keepalive = None;
    }
}

async fn next_event(
    session: &mut Option<TransportSession>,
) -> Option<Result<TransportEvent, TransportError>> {
    match session {
        Some(session) => session.events.next().await,
        None => std::future::pending().await,
    }
}

async fn finish_open(
    opening: &mut Option<PendingOpen>,
) -> Result<TransportSession, TransportError> {
    match opening {
        Some(open) => open.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn expire(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
