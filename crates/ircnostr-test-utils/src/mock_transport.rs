// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable chat transport for driving `ChannelConnection` in tests.
//!
//! Every successful `open()` creates a [`MockSession`] whose event stream is
//! fed by the test. Failures can be queued per open, or made permanent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ircnostr_core::error::{TransportError, TransportErrorKind};
use ircnostr_core::traits::{TransportConnector, TransportEvent, TransportLink, TransportSession};
use tokio::sync::{mpsc, Notify};

type EventSender = mpsc::UnboundedSender<Result<TransportEvent, TransportError>>;

/// Test-side control of one opened session.
#[derive(Clone)]
pub struct MockSession {
    events: EventSender,
    probes: Arc<Mutex<Vec<String>>>,
    quits: Arc<Mutex<Vec<String>>>,
    fail_probes: Arc<AtomicBool>,
}

impl MockSession {
    /// Server acknowledges registration.
    pub fn register(&self) {
        let _ = self.events.send(Ok(TransportEvent::Registered {
            server: "mock.irc.test".into(),
        }));
    }

    pub fn privmsg(&self, sender: &str, target: &str, text: &str) {
        let _ = self.events.send(Ok(TransportEvent::Privmsg {
            sender: sender.into(),
            target: target.into(),
            text: text.into(),
        }));
    }

    /// Server closes the session.
    pub fn close(&self, reason: &str) {
        let _ = self.events.send(Ok(TransportEvent::Closed {
            reason: reason.into(),
        }));
    }

    /// Surfaces a transport error of the given kind.
    pub fn fail(&self, kind: TransportErrorKind) {
        let _ = self
            .events
            .send(Err(TransportError::new(kind, "injected by test")));
    }

    /// Makes every following keep-alive probe fail.
    pub fn fail_probes(&self) {
        self.fail_probes.store(true, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        lock(&self.probes).len()
    }

    pub fn quit_reasons(&self) -> Vec<String> {
        lock(&self.quits).clone()
    }
}

struct MockLink {
    probes: Arc<Mutex<Vec<String>>>,
    quits: Arc<Mutex<Vec<String>>>,
    fail_probes: Arc<AtomicBool>,
}

impl TransportLink for MockLink {
    fn probe(&self, token: &str) -> Result<(), TransportError> {
        if self.fail_probes.load(Ordering::SeqCst) {
            return Err(TransportError::new(
                TransportErrorKind::ConnectionReset,
                "probe write failed",
            ));
        }
        lock(&self.probes).push(token.to_string());
        Ok(())
    }

    fn quit(&self, reason: &str) -> Result<(), TransportError> {
        lock(&self.quits).push(reason.to_string());
        Ok(())
    }
}

/// A [`TransportConnector`] whose outcomes are controlled by the test.
pub struct MockConnector {
    queued_failures: Mutex<VecDeque<TransportError>>,
    always_fail: Mutex<Option<TransportErrorKind>>,
    hang: AtomicBool,
    sessions: Mutex<Vec<MockSession>>,
    opens: AtomicUsize,
    opened: Notify,
}

impl MockConnector {
    /// Every open succeeds.
    pub fn new() -> Self {
        Self {
            queued_failures: Mutex::new(VecDeque::new()),
            always_fail: Mutex::new(None),
            hang: AtomicBool::new(false),
            sessions: Mutex::new(Vec::new()),
            opens: AtomicUsize::new(0),
            opened: Notify::new(),
        }
    }

    /// Every open fails with `kind`.
    pub fn failing(kind: TransportErrorKind) -> Self {
        let connector = Self::new();
        connector.set_always_fail(Some(kind));
        connector
    }

    pub fn set_always_fail(&self, kind: Option<TransportErrorKind>) {
        *lock(&self.always_fail) = kind;
    }

    /// While set, opens never complete (a server that accepts nothing).
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// The next open fails with `kind`; later opens are unaffected.
    pub fn fail_next(&self, kind: TransportErrorKind) {
        lock(&self.queued_failures).push_back(TransportError::new(kind, "queued failure"));
    }

    /// Number of `open()` calls so far, failed or not.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn session(&self, index: usize) -> Option<MockSession> {
        lock(&self.sessions).get(index).cloned()
    }

    pub fn latest_session(&self) -> Option<MockSession> {
        lock(&self.sessions).last().cloned()
    }

    /// Waits until at least `count` sessions have been opened successfully.
    pub async fn wait_for_sessions(&self, count: usize) -> MockSession {
        loop {
            let notified = self.opened.notified();
            {
                let sessions = lock(&self.sessions);
                if sessions.len() >= count {
                    return sessions[count - 1].clone();
                }
            }
            notified.await;
        }
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportConnector for MockConnector {
    fn endpoint(&self) -> String {
        "mock://irc.test:6667".into()
    }

    async fn open(&self) -> Result<TransportSession, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        if self.hang.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }

        if let Some(err) = lock(&self.queued_failures).pop_front() {
            return Err(err);
        }
        if let Some(kind) = *lock(&self.always_fail) {
            return Err(TransportError::new(kind, "connector set to fail"));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = MockSession {
            events: events_tx,
            probes: Arc::new(Mutex::new(Vec::new())),
            quits: Arc::new(Mutex::new(Vec::new())),
            fail_probes: Arc::new(AtomicBool::new(false)),
        };
        let link = MockLink {
            probes: session.probes.clone(),
            quits: session.quits.clone(),
            fail_probes: session.fail_probes.clone(),
        };
        lock(&self.sessions).push(session);
        self.opened.notify_waiters();

        let events = futures::stream::unfold(events_rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        Ok(TransportSession {
            link: Box::new(link),
            events: Box::pin(events),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn open_yields_controllable_session() {
        let connector = MockConnector::new();
        let mut session = connector.open().await.unwrap();
        let control = connector.session(0).unwrap();

        control.register();
        control.privmsg("BlockBot", "#blocks", "hello");

        assert!(matches!(
            session.events.next().await,
            Some(Ok(TransportEvent::Registered { .. }))
        ));
        assert!(matches!(
            session.events.next().await,
            Some(Ok(TransportEvent::Privmsg { text, .. })) if text == "hello"
        ));

        session.link.probe("t1").unwrap();
        session.link.quit("bye").unwrap();
        assert_eq!(control.probe_count(), 1);
        assert_eq!(control.quit_reasons(), vec!["bye".to_string()]);
    }

    #[tokio::test]
    async fn queued_failure_applies_once() {
        let connector = MockConnector::new();
        connector.fail_next(TransportErrorKind::ConnectionRefused);

        let first = connector.open().await;
        assert_eq!(
            first.unwrap_err().kind,
            TransportErrorKind::ConnectionRefused
        );
        assert!(connector.open().await.is_ok());
        assert_eq!(connector.open_count(), 2);
    }

    #[tokio::test]
    async fn failing_connector_never_opens() {
        let connector = MockConnector::failing(TransportErrorKind::Timeout);
        for _ in 0..3 {
            assert!(connector.open().await.is_err());
        }
        assert!(connector.latest_session().is_none());
    }
}
