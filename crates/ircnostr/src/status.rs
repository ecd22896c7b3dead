// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ircnostr status` command implementation.
//!
//! Queries the gateway `/status` endpoint of a running instance. Falls back
//! to a "not running" report when nothing answers.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use ircnostr_config::model::BridgeConfig;
use ircnostr_core::error::BridgeError;
use serde::{Deserialize, Serialize};

/// Subset of the gateway `/status` body this command displays.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteStatus {
    pub version: String,
    pub stats: RemoteStats,
    pub connection: RemoteConnection,
    pub server: String,
    pub channel: String,
    pub target_sender: String,
    pub relays: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteStats {
    pub messages_observed: u64,
    pub successful_publishes: u64,
    pub failed_publishes: u64,
    pub last_activity: Option<String>,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConnection {
    pub state: String,
    pub reconnect_attempts: u32,
    #[serde(default)]
    pub retries_exhausted: bool,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub running: bool,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<RemoteStatus>,
}

/// Loads configuration without validation; status only needs the gateway address.
pub fn load_lenient(path: Option<&Path>) -> BridgeConfig {
    let loaded = match path {
        Some(path) => ircnostr_config::load_config_from_path(path),
        None => ircnostr_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("warning: could not read configuration ({e}), using defaults");
        BridgeConfig::default()
    })
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Run the `ircnostr status` command.
pub async fn run_status(config: &BridgeConfig, json: bool, plain: bool) -> Result<(), BridgeError> {
    let endpoint = format!(
        "http://{}:{}/status",
        config.gateway.host, config.gateway.port
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| BridgeError::Internal(format!("failed to create HTTP client: {e}")))?;

    let remote = match client.get(&endpoint).send().await {
        Ok(resp) if resp.status().is_success() => Some(
            resp.json::<RemoteStatus>()
                .await
                .map_err(|e| BridgeError::Internal(format!("failed to parse status response: {e}")))?,
        ),
        _ => None,
    };

    let report = StatusReport {
        running: remote.is_some(),
        endpoint,
        uptime_human: remote.as_ref().map(|r| format_uptime(r.stats.uptime_secs)),
        bridge: remote,
    };

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| BridgeError::Internal(format!("failed to encode status: {e}")))?;
        println!("{text}");
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render_report(&report, use_color));
    }
    Ok(())
}

fn render_report(report: &StatusReport, use_color: bool) -> String {
    use colored::Colorize;
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "  ircnostr status");
    let _ = writeln!(out, "  {}", "-".repeat(35));

    let Some(bridge) = &report.bridge else {
        if use_color {
            let _ = writeln!(out, "    State:    {} {}", "✗".red(), "not running".red());
        } else {
            let _ = writeln!(out, "    State:    [FAIL] not running");
        }
        let _ = writeln!(out, "    Endpoint: {}", report.endpoint);
        let _ = writeln!(out);
        let _ = writeln!(out, "  Start with: ircnostr serve");
        let _ = writeln!(out);
        return out;
    };

    let uptime = report.uptime_human.as_deref().unwrap_or("-");
    let registered = bridge.connection.state == "registered";
    let state = match (registered, use_color) {
        (true, true) => format!("{} {}", "✓".green(), bridge.connection.state.green()),
        (false, true) => format!("{} {}", "!".yellow(), bridge.connection.state.yellow()),
        (true, false) => format!("[OK] {}", bridge.connection.state),
        (false, false) => format!("[WARN] {}", bridge.connection.state),
    };
    let _ = writeln!(out, "    State:    {state} (uptime: {uptime})");
    let _ = writeln!(
        out,
        "    IRC:      {} {} watching {}",
        bridge.server, bridge.channel, bridge.target_sender
    );
    if bridge.connection.reconnect_attempts > 0 || bridge.connection.retries_exhausted {
        let _ = writeln!(
            out,
            "    Retries:  {}{}",
            bridge.connection.reconnect_attempts,
            if bridge.connection.retries_exhausted {
                " (exhausted)"
            } else {
                ""
            }
        );
    }
    if let Some(err) = &bridge.connection.last_error {
        let _ = writeln!(out, "    Error:    {err}");
    }
    let _ = writeln!(
        out,
        "    Relays:   {}{}",
        bridge.relays.len(),
        if bridge.dry_run { " (dry run)" } else { "" }
    );
    let _ = writeln!(
        out,
        "    Messages: {} observed, {} published, {} failed",
        bridge.stats.messages_observed,
        bridge.stats.successful_publishes,
        bridge.stats.failed_publishes
    );
    if let Some(last) = &bridge.stats.last_activity {
        let _ = writeln!(out, "    Last:     {last}");
    }
    let _ = writeln!(out);
    out
}
