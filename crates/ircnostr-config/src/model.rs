// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the ircnostr bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level bridge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. Every section except `nostr.secret_key` has working defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Source chat server, channel and monitored sender.
    #[serde(default)]
    pub irc: IrcConfig,

    /// Signing key and relay list.
    #[serde(default)]
    pub nostr: NostrConfig,

    /// Rate limiting of the monitored sender.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Health/status HTTP surface.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Process-level settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Prometheus metrics export.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// IRC connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IrcConfig {
    /// Server hostname.
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect with TLS.
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,

    #[serde(default = "default_nickname")]
    pub nickname: String,

    /// Defaults to the nickname when unset.
    #[serde(default)]
    pub username: Option<String>,

    /// Defaults to the nickname when unset.
    #[serde(default)]
    pub realname: Option<String>,

    /// The single channel to join and watch.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Nickname whose messages are relayed (exact, case-sensitive).
    #[serde(default = "default_target_sender")]
    pub target_sender: String,

    /// Interval between keep-alive PINGs once registered.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// Fixed wait before each reconnect attempt.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Consecutive reconnect attempts before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Deadline for opening the transport.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            use_tls: default_use_tls(),
            nickname: default_nickname(),
            username: None,
            realname: None,
            channel: default_channel(),
            target_sender: default_target_sender(),
            keepalive_secs: default_keepalive_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl IrcConfig {
    pub fn effective_username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nickname)
    }

    pub fn effective_realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nickname)
    }
}

fn default_server() -> String {
    "irc.libera.chat".to_string()
}

fn default_port() -> u16 {
    6697
}

fn default_use_tls() -> bool {
    true
}

fn default_nickname() -> String {
    "ircnostr".to_string()
}

fn default_channel() -> String {
    "#ircnostr".to_string()
}

fn default_target_sender() -> String {
    "announcer".to_string()
}

fn default_keepalive_secs() -> u64 {
    60
}

fn default_reconnect_delay_secs() -> u64 {
    10
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// Nostr signing and relay configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NostrConfig {
    /// Signing key as `nsec1...` bech32 or 64 hex characters. Required.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Relay WebSocket URLs to publish to.
    #[serde(default = "default_relays")]
    pub relays: Vec<String>,

    /// Log posts instead of publishing them.
    #[serde(default)]
    pub dry_run: bool,

    /// Per-relay deadline for connect, submit and acknowledgment.
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,
}

impl Default for NostrConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            relays: default_relays(),
            dry_run: false,
            publish_timeout_secs: default_publish_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for NostrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NostrConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[redacted]"))
            .field("relays", &self.relays)
            .field("dry_run", &self.dry_run)
            .field("publish_timeout_secs", &self.publish_timeout_secs)
            .finish()
    }
}

/// The five public relays used when none are configured.
pub fn default_relays() -> Vec<String> {
    [
        "wss://relay.damus.io",
        "wss://nos.lol",
        "wss://relay.nostr.band",
        "wss://relay.primal.net",
        "wss://nostr.mom",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_publish_timeout_secs() -> u64 {
    10
}

/// Sliding-window rate limit applied to the monitored sender.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Messages accepted per window.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: usize,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
        }
    }
}

fn default_rate_limit_max() -> usize {
    5
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

/// Health/status HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the recorder and serve `/metrics`.
    #[serde(default = "default_prometheus_enabled")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: default_prometheus_enabled(),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    true
}
