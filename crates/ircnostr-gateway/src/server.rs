// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};
use ircnostr_config::model::{BridgeConfig, GatewayConfig};
use ircnostr_core::error::BridgeError;
use ircnostr_irc::ConnectionSnapshot;
use ircnostr_relay::RelayStats;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Configuration facts reported by `/status`. Fixed for the process lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeFacts {
    pub server: String,
    pub channel: String,
    pub target_sender: String,
    pub relays: Vec<String>,
    pub dry_run: bool,
}

impl BridgeFacts {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            server: config.irc.server.clone(),
            channel: config.irc.channel.clone(),
            target_sender: config.irc.target_sender.clone(),
            relays: config.nostr.relays.clone(),
            dry_run: config.nostr.dry_run,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub stats: Arc<RelayStats>,
    pub connection: watch::Receiver<ConnectionSnapshot>,
    pub facts: Arc<BridgeFacts>,
    /// False when no publisher could be built; `/health` then reports unhealthy.
    pub publisher_configured: bool,
    /// Prometheus text renderer, `None` when metrics export is disabled.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
    pub start_time: Instant,
}

/// Bind address of the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Routes without a listener, so handlers can be driven in-process.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/status", get(handlers::get_status))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serves the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), BridgeError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BridgeError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| BridgeError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facts_mirror_config() {
        let mut config = BridgeConfig::default();
        config.irc.server = "irc.example.net".into();
        config.irc.channel = "#blocks".into();
        config.irc.target_sender = "BlockBot".into();
        config.nostr.dry_run = true;

        let facts = BridgeFacts::from_config(&config);
        assert_eq!(facts.server, "irc.example.net");
        assert_eq!(facts.target_sender, "BlockBot");
        assert_eq!(facts.relays, config.nostr.relays);
        assert!(facts.dry_run);
    }

    #[test]
    fn server_config_from_gateway_section() {
        let server = ServerConfig::from(&GatewayConfig::default());
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 3000);
    }
}
