// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ircnostr serve` command implementation.
//!
//! Builds the chat connection, filter pipeline and publisher from the
//! validated configuration, starts the optional HTTP gateway, and runs the
//! relay engine until a signal or an unrecoverable transport fault.

use std::sync::Arc;

use ircnostr_config::model::BridgeConfig;
use ircnostr_core::error::BridgeError;
use ircnostr_core::traits::PluginAdapter;
use ircnostr_core::types::HealthStatus;
use ircnostr_filter::RelayFilterPipeline;
use ircnostr_irc::{ChannelConnection, ConnectionSettings, IrcConnector};
use ircnostr_nostr::FanoutPublisher;
use ircnostr_relay::{install_signal_handler, RelayEngine, RelayStats};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs the `ircnostr serve` command.
pub async fn run_serve(config: BridgeConfig) -> Result<(), BridgeError> {
    init_tracing(&config.daemon.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        server = %config.irc.server,
        channel = %config.irc.channel,
        target_sender = %config.irc.target_sender,
        "starting ircnostr serve"
    );

    #[cfg(feature = "prometheus")]
    let prometheus_adapter = if config.prometheus.enabled {
        match ircnostr_prometheus::PrometheusAdapter::new() {
            Ok(adapter) => Some(adapter),
            Err(e) => {
                warn!(error = %e, "prometheus initialization failed, continuing without metrics");
                None
            }
        }
    } else {
        debug!("prometheus metrics disabled by configuration");
        None
    };

    let publisher = Arc::new(FanoutPublisher::from_config(&config.nostr)?);
    info!(
        pubkey = publisher.public_key_hex(),
        relays = publisher.relays().len(),
        dry_run = publisher.is_dry_run(),
        "nostr publisher ready"
    );

    let shutdown = CancellationToken::new();
    install_signal_handler(shutdown.clone());

    let connection = Arc::new(ChannelConnection::spawn(
        Arc::new(IrcConnector::new(&config.irc)),
        ConnectionSettings::from_config(&config.irc),
        shutdown.clone(),
    ));
    let pipeline = RelayFilterPipeline::from_config(&config.irc, &config.filter);
    let stats = Arc::new(RelayStats::new());

    #[allow(unused_mut)]
    let mut adapters: Vec<Arc<dyn PluginAdapter>> = vec![
        publisher.clone() as Arc<dyn PluginAdapter>,
        connection.clone() as Arc<dyn PluginAdapter>,
    ];
    #[cfg(feature = "prometheus")]
    {
        if let Some(adapter) = &prometheus_adapter {
            adapters.push(Arc::new(adapter.clone()));
        }
    }
    log_adapter_health(&adapters).await;

    #[cfg(feature = "gateway")]
    let gateway = if config.gateway.enabled {
        #[cfg(feature = "prometheus")]
        let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
            prometheus_adapter.as_ref().map(|adapter| {
                let adapter = adapter.clone();
                Arc::new(move || adapter.render()) as Arc<dyn Fn() -> String + Send + Sync>
            });
        #[cfg(not(feature = "prometheus"))]
        let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> = None;

        let state = ircnostr_gateway::GatewayState {
            stats: stats.clone(),
            connection: connection.watch(),
            facts: Arc::new(ircnostr_gateway::BridgeFacts::from_config(&config)),
            publisher_configured: !publisher.relays().is_empty(),
            prometheus_render,
            start_time: std::time::Instant::now(),
        };
        let server_config = ircnostr_gateway::ServerConfig::from(&config.gateway);
        let token = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = ircnostr_gateway::start_server(&server_config, state, token).await {
                error!(error = %e, "gateway stopped with an error");
            }
        }))
    } else {
        debug!("gateway disabled by configuration");
        None
    };

    let engine = RelayEngine::new(
        connection.clone(),
        pipeline,
        publisher.clone(),
        stats.clone(),
        shutdown.clone(),
    );
    let result = engine.run().await;

    // The engine may have stopped on its own; make sure the gateway follows.
    shutdown.cancel();
    #[cfg(feature = "gateway")]
    {
        if let Some(handle) = gateway
            && let Err(e) = handle.await
        {
            warn!(error = %e, "gateway task did not finish cleanly");
        }
    }

    for adapter in &adapters {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }

    let snapshot = stats.snapshot();
    info!(
        observed = snapshot.messages_observed,
        published = snapshot.successful_publishes,
        failed = snapshot.failed_publishes,
        uptime_secs = snapshot.uptime_secs,
        "ircnostr stopped"
    );
    result
}

async fn log_adapter_health(adapters: &[Arc<dyn PluginAdapter>]) {
    for adapter in adapters {
        match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => {
                info!(adapter = adapter.name(), version = %adapter.version(), "adapter healthy");
            }
            Ok(status) => {
                info!(adapter = adapter.name(), ?status, "adapter not yet healthy");
            }
            Err(e) => {
                warn!(adapter = adapter.name(), error = %e, "adapter health check failed");
            }
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ircnostr={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
