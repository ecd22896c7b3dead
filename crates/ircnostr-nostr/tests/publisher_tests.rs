// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out tests over the mock sink and a local WebSocket relay.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use ircnostr_core::error::BridgeError;
use ircnostr_core::traits::RelaySink;
use ircnostr_core::types::{OutboundPost, SignedEvent};
use ircnostr_nostr::{sign_post, verify_event, FanoutPublisher, SigningKeys, WebSocketRelaySink};
use ircnostr_test_utils::MockRelaySink;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

const HEX_KEY: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

fn relays(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("wss://relay{i}.test")).collect()
}

fn post() -> OutboundPost {
    OutboundPost {
        content: "block 840000 found".into(),
        tags: ["bitcoin".to_string(), "blockbot".to_string()].into(),
        created_at: Utc::now(),
    }
}

fn publisher(sink: &MockRelaySink, relays: Vec<String>, dry_run: bool) -> FanoutPublisher {
    FanoutPublisher::new(
        SigningKeys::parse(HEX_KEY).unwrap(),
        relays,
        Arc::new(sink.clone()),
        dry_run,
    )
}

#[tokio::test]
async fn two_failing_relays_out_of_five() {
    let sink = MockRelaySink::new();
    sink.fail_relay("wss://relay1.test").await;
    sink.fail_relay("wss://relay3.test").await;

    let outcome = publisher(&sink, relays(5), false).publish(&post()).await;

    assert_eq!(outcome.attempted, 5);
    assert_eq!(outcome.succeeded, 3);
    assert_eq!(outcome.failed, 2);
    assert!(outcome.is_delivered());
    let failed: Vec<_> = outcome
        .results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.endpoint.as_str())
        .collect();
    assert_eq!(failed, vec!["wss://relay1.test", "wss://relay3.test"]);
}

#[tokio::test]
async fn all_relays_failing_is_not_delivered() {
    let sink = MockRelaySink::new();
    for relay in relays(3) {
        sink.fail_relay(&relay).await;
    }

    let outcome = publisher(&sink, relays(3), false).publish(&post()).await;

    assert_eq!(outcome.succeeded, 0);
    assert_eq!(outcome.failed, 3);
    assert!(!outcome.is_delivered());
    assert_eq!(sink.call_count().await, 3, "each relay tried exactly once");
}

#[tokio::test]
async fn every_relay_receives_the_same_signed_event() {
    let sink = MockRelaySink::new();
    publisher(&sink, relays(4), false).publish(&post()).await;

    let delivered = sink.delivered().await;
    assert_eq!(delivered.len(), 4);
    let first = &delivered[0].1;
    assert!(delivered.iter().all(|(_, event)| event == first));
    assert!(verify_event(first).unwrap());
    assert!(first.content.ends_with("#bitcoin #blockbot"));
}

#[tokio::test]
async fn dry_run_makes_no_sink_calls() {
    let sink = MockRelaySink::new();
    let outcome = publisher(&sink, relays(5), true).publish(&post()).await;

    assert_eq!(outcome.attempted, 5);
    assert_eq!(outcome.succeeded, 5);
    assert_eq!(outcome.failed, 0);
    assert_eq!(sink.call_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn slow_relay_does_not_hold_back_the_others() {
    struct Deadline(MockRelaySink);

    #[async_trait::async_trait]
    impl RelaySink for Deadline {
        async fn deliver(&self, relay: &str, event: &SignedEvent) -> Result<(), BridgeError> {
            let limit = Duration::from_secs(10);
            tokio::time::timeout(limit, self.0.deliver(relay, event))
                .await
                .map_err(|_| BridgeError::Timeout { duration: limit })?
        }
    }

    let sink = MockRelaySink::new();
    sink.hang_relay("wss://relay0.test").await;
    let publisher = FanoutPublisher::new(
        SigningKeys::parse(HEX_KEY).unwrap(),
        relays(3),
        Arc::new(Deadline(sink.clone())),
        false,
    );

    let started = tokio::time::Instant::now();
    let outcome = publisher.publish(&post()).await;
    assert_eq!((outcome.succeeded, outcome.failed), (2, 1));
    assert!(outcome.results[0].error.as_deref().unwrap().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(11));
}

/// Minimal relay: accepts one connection and answers the EVENT with `OK`.
async fn local_relay(accept: bool) -> (String, tokio::task::JoinHandle<Option<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.ok()?;
        let mut ws = tokio_tungstenite::accept_async(stream).await.ok()?;
        let frame = match ws.next().await? {
            Ok(Message::Text(text)) => text.as_str().to_string(),
            _ => return None,
        };
        let parsed: serde_json::Value = serde_json::from_str(&frame).ok()?;
        let id = parsed[1]["id"].as_str()?.to_string();
        let reply = serde_json::json!(["NOTICE", "hello"]).to_string();
        ws.send(Message::text(reply)).await.ok()?;
        let reason = if accept { "" } else { "blocked: test" };
        let reply = serde_json::json!(["OK", id, accept, reason]);
        ws.send(Message::text(reply.to_string())).await.ok()?;
        // Drain until the client closes.
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
        Some(frame)
    });
    (url, handle)
}

#[tokio::test]
async fn websocket_sink_delivers_and_waits_for_ok() {
    let (url, relay) = local_relay(true).await;
    let event = sign_post(&post(), &SigningKeys::parse(HEX_KEY).unwrap()).unwrap();

    WebSocketRelaySink::new(Duration::from_secs(5))
        .deliver(&url, &event)
        .await
        .unwrap();

    let frame = relay.await.unwrap().expect("relay saw an EVENT frame");
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed[0], "EVENT");
    assert_eq!(parsed[1]["id"], event.id.as_str());
    assert_eq!(parsed[1]["kind"], 1);
}

#[tokio::test]
async fn websocket_sink_reports_rejection() {
    let (url, relay) = local_relay(false).await;
    let event = sign_post(&post(), &SigningKeys::parse(HEX_KEY).unwrap()).unwrap();

    let err = WebSocketRelaySink::new(Duration::from_secs(5))
        .deliver(&url, &event)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Publish { ref message, .. } if message.contains("blocked: test")));
    relay.await.unwrap();
}

#[tokio::test]
async fn websocket_sink_reports_refused_connection() {
    // Bind then drop to get a port with nothing listening.
    let port = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let event = sign_post(&post(), &SigningKeys::parse(HEX_KEY).unwrap()).unwrap();

    let err = WebSocketRelaySink::new(Duration::from_secs(5))
        .deliver(&format!("ws://127.0.0.1:{port}"), &event)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Publish { .. }));
}

/// Relay that completes the handshake, reads the EVENT and never answers.
async fn silent_relay() -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });
    (url, handle)
}

#[tokio::test]
async fn websocket_sink_times_out_on_a_silent_relay() {
    let (url, _relay) = silent_relay().await;
    let event = sign_post(&post(), &SigningKeys::parse(HEX_KEY).unwrap()).unwrap();

    let started = std::time::Instant::now();
    let err = WebSocketRelaySink::new(Duration::from_secs(1))
        .deliver(&url, &event)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { duration } if duration == Duration::from_secs(1)));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn silent_relay_is_marked_failed_in_the_fanout() {
    let (silent, _silent_relay) = silent_relay().await;
    let (answering, answering_relay) = local_relay(true).await;
    let publisher = FanoutPublisher::new(
        SigningKeys::parse(HEX_KEY).unwrap(),
        vec![silent.clone(), answering.clone()],
        Arc::new(WebSocketRelaySink::new(Duration::from_secs(1))),
        false,
    );

    let outcome = publisher.publish(&post()).await;
    assert_eq!((outcome.succeeded, outcome.failed), (1, 1));
    assert_eq!(outcome.results[0].endpoint, silent);
    assert!(outcome.results[0].error.as_deref().unwrap().contains("timed out"));
    assert!(outcome.results[1].success);
    answering_relay.await.unwrap();
}

