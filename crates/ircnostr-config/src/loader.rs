// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ircnostr.toml` > `~/.config/ircnostr/ircnostr.toml` >
//! `/etc/ircnostr/ircnostr.toml` with environment variable overrides via the
//! `IRCNOSTR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BridgeConfig;

/// Config file name looked up in every directory of the hierarchy.
pub const CONFIG_FILE_NAME: &str = "ircnostr.toml";

/// System-wide config path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/ircnostr/ircnostr.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ircnostr/ircnostr.toml` (system-wide)
/// 3. `~/.config/ircnostr/ircnostr.toml` (user XDG config)
/// 4. `./ircnostr.toml` (local directory)
/// 5. `IRCNOSTR_*` environment variables
pub fn load_config() -> Result<BridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("ircnostr").join(CONFIG_FILE_NAME))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `IRCNOSTR_IRC_TARGET_SENDER` must map to `irc.target_sender`,
/// not `irc.target.sender`.
fn env_provider() -> Env {
    Env::prefixed("IRCNOSTR_").map(|key| {
        // `key` keeps the env var's case with the prefix stripped.
        // Example: IRCNOSTR_NOSTR_SECRET_KEY -> "NOSTR_SECRET_KEY" -> "nostr.secret_key"
        let key_str = key.as_str().to_ascii_lowercase();
        SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key_str)
            .into()
    })
}

/// Top-level config sections addressable from the environment.
const SECTIONS: [&str; 6] = ["irc", "nostr", "filter", "gateway", "daemon", "prometheus"];
