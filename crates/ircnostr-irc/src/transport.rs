// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IRC wire transport backed by the `irc` crate.
//!
//! Registration (NICK/USER) is sent by `identify()`, the configured channel is
//! joined by the client once the MOTD ends, and server PINGs are answered by
//! the client itself. This module only translates the client's message stream
//! into [`TransportEvent`]s and classifies its errors.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use irc::client::prelude::{Client, Command, Config, Message, Prefix, Response, Sender};
use ircnostr_config::model::IrcConfig;
use ircnostr_core::error::{TransportError, TransportErrorKind};
use ircnostr_core::traits::{TransportConnector, TransportEvent, TransportLink, TransportSession};
use tracing::debug;

/// Seconds the client waits for a PONG before reporting a ping timeout.
const PING_TIMEOUT_SECS: u32 = 20;

/// Opens IRC sessions for one server and channel.
pub struct IrcConnector {
    config: Config,
    endpoint: String,
}

impl IrcConnector {
    pub fn new(irc: &IrcConfig) -> Self {
        let config = Config {
            nickname: Some(irc.nickname.clone()),
            username: Some(irc.effective_username().to_string()),
            realname: Some(irc.effective_realname().to_string()),
            server: Some(irc.server.clone()),
            port: Some(irc.port),
            use_tls: Some(irc.use_tls),
            channels: vec![irc.channel.clone()],
            ping_time: Some(u32::try_from(irc.keepalive_secs.saturating_mul(2)).unwrap_or(u32::MAX)),
            ping_timeout: Some(PING_TIMEOUT_SECS),
            ..Config::default()
        };
        let scheme = if irc.use_tls { "ircs" } else { "irc" };
        Self {
            endpoint: format!("{scheme}://{}:{}", irc.server, irc.port),
            config,
        }
    }
}

#[async_trait]
impl TransportConnector for IrcConnector {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn open(&self) -> Result<TransportSession, TransportError> {
        let mut client = Client::from_config(self.config.clone())
            .await
            .map_err(classify)?;
        client.identify().map_err(classify)?;
        let stream = client.stream().map_err(classify)?;

        let fallback_server = self.config.server.clone().unwrap_or_default();
        let events = stream.filter_map(move |item| {
            let fallback_server = fallback_server.clone();
            async move {
                match item {
                    Ok(message) => translate(message, &fallback_server).map(Ok),
                    Err(err) => Some(Err(classify(err))),
                }
            }
        });

        Ok(TransportSession {
            link: Box::new(IrcLink {
                sender: client.sender(),
                _client: Mutex::new(client),
            }),
            events: Box::pin(events),
        })
    }
}

struct IrcLink {
    sender: Sender,
    /// Holds the client state for as long as the session lives.
    _client: Mutex<Client>,
}

impl TransportLink for IrcLink {
    fn probe(&self, token: &str) -> Result<(), TransportError> {
        self.sender
            .send(Command::PING(token.to_string(), None))
            .map_err(classify)
    }

    fn quit(&self, reason: &str) -> Result<(), TransportError> {
        self.sender
            .send(Command::QUIT(Some(reason.to_string())))
            .map_err(classify)
    }
}

/// Maps one IRC message onto the events the connection cares about.
fn translate(message: Message, fallback_server: &str) -> Option<TransportEvent> {
    let sender = message.source_nickname().map(str::to_string);
    match message.command {
        Command::Response(Response::RPL_WELCOME, _) => {
            let server = match &message.prefix {
                Some(Prefix::ServerName(name)) => name.clone(),
                _ => fallback_server.to_string(),
            };
            Some(TransportEvent::Registered { server })
        }
        Command::PRIVMSG(target, text) => match sender {
            Some(sender) => Some(TransportEvent::Privmsg {
                sender,
                target,
                text,
            }),
            None => {
                debug!(%target, "PRIVMSG without a source nickname");
                None
            }
        },
        Command::ERROR(reason) => Some(TransportEvent::Closed { reason }),
        _ => None,
    }
}

/// Sorts client errors into the closed [`TransportErrorKind`] set.
fn classify(err: irc::error::Error) -> TransportError {
    use irc::error::Error;

    match &err {
        Error::Io(io) => TransportError::from_io(io),
        Error::Tls { .. } => TransportError::new(TransportErrorKind::Tls, err.to_string()),
        Error::PingTimeout { .. } => {
            TransportError::new(TransportErrorKind::Timeout, err.to_string())
        }
        Error::InvalidMessage { .. } | Error::NoUsableNick { .. } => {
            TransportError::new(TransportErrorKind::Protocol, err.to_string())
        }
        Error::AsyncChannelClosed { .. } => {
            TransportError::new(TransportErrorKind::ConnectionReset, err.to_string())
        }
        _ => TransportError::new(TransportErrorKind::Unclassified, err.to_string()),
    }
}
