// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket delivery of one event to one relay.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use ircnostr_core::error::BridgeError;
use ircnostr_core::traits::RelaySink;
use ircnostr_core::types::SignedEvent;
use serde_json::Value;
use tokio::time::{timeout_at, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// Extra time allowed past the delivery deadline for the close handshake.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

type RelaySocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Relay sink over `tokio-tungstenite`: one short-lived connection per event.
///
/// Connect, submit and acknowledgment share a single deadline; the socket is
/// closed on every path once it has been opened, within a short grace period.
#[derive(Debug, Clone)]
pub struct WebSocketRelaySink {
    timeout: Duration,
}

impl WebSocketRelaySink {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RelaySink for WebSocketRelaySink {
    async fn deliver(&self, relay: &str, event: &SignedEvent) -> Result<(), BridgeError> {
        let deadline = Instant::now() + self.timeout;
        let timed_out = || BridgeError::Timeout {
            duration: self.timeout,
        };

        let (mut socket, _response) = timeout_at(deadline, connect_async(relay))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| publish_error(relay, format!("connect failed: {e}")))?;

        let result = match timeout_at(deadline, submit(&mut socket, event)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(publish_error(relay, message)),
            Err(_) => Err(timed_out()),
        };

        match timeout_at(deadline + CLOSE_GRACE, socket.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(relay, error = %e, "relay socket close failed"),
            Err(_) => debug!(relay, "relay socket close timed out, dropping it"),
        }
        result
    }
}

/// Sends `["EVENT", event]` and waits for the matching `OK`.
async fn submit(socket: &mut RelaySocket, event: &SignedEvent) -> Result<(), String> {
    let frame = serde_json::to_string(&("EVENT", event))
        .map_err(|e| format!("event serialization failed: {e}"))?;
    socket
        .send(Message::text(frame))
        .await
        .map_err(|e| format!("send failed: {e}"))?;

    while let Some(message) = socket.next().await {
        match message.map_err(|e| format!("socket error: {e}"))? {
            Message::Text(text) => match parse_ok(text.as_str(), &event.id) {
                Some(Ack { accepted: true, .. }) => return Ok(()),
                Some(Ack {
                    accepted: false,
                    message,
                }) => return Err(format!("rejected: {message}")),
                None => debug!(frame = %text.as_str(), "ignoring relay frame"),
            },
            Message::Close(_) => return Err("relay closed before acknowledging".into()),
            _ => {}
        }
    }
    Err("connection ended before acknowledgment".into())
}

#[derive(Debug, PartialEq, Eq)]
struct Ack {
    accepted: bool,
    message: String,
}

/// Parses `["OK", <event id>, <accepted>, <message>]` for the given id.
fn parse_ok(frame: &str, event_id: &str) -> Option<Ack> {
    let value: Value = serde_json::from_str(frame).ok()?;
    let items = value.as_array()?;
    if items.first()?.as_str()? != "OK" || items.get(1)?.as_str()? != event_id {
        return None;
    }
    Some(Ack {
        accepted: items.get(2)?.as_bool()?,
        message: items
            .get(3)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn publish_error(relay: &str, message: String) -> BridgeError {
    BridgeError::Publish {
        endpoint: relay.to_string(),
        message,
    }
}
