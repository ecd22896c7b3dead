// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the ircnostr configuration system.

use ircnostr_config::diagnostic::{suggest_key, ConfigError};
use ircnostr_config::model::BridgeConfig;
use ircnostr_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

const HEX_KEY: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_bridge_config() {
    let toml = format!(
        r##"
[irc]
server = "irc.example.net"
port = 6667
use_tls = false
nickname = "relaybot"
channel = "#blocks"
target_sender = "BlockBot"
keepalive_secs = 30
reconnect_delay_secs = 5
max_reconnect_attempts = 3

[nostr]
secret_key = "{HEX_KEY}"
relays = ["wss://relay.one", "wss://relay.two"]
dry_run = true

[filter]
rate_limit_max = 2
rate_limit_window_secs = 30

[gateway]
host = "0.0.0.0"
port = 8080

[daemon]
log_level = "debug"

[prometheus]
enabled = false
"##
    );

    let config = load_config_from_str(&toml).expect("valid TOML should deserialize");
    assert_eq!(config.irc.server, "irc.example.net");
    assert_eq!(config.irc.port, 6667);
    assert!(!config.irc.use_tls);
    assert_eq!(config.irc.channel, "#blocks");
    assert_eq!(config.irc.target_sender, "BlockBot");
    assert_eq!(config.irc.max_reconnect_attempts, 3);
    assert_eq!(config.nostr.secret_key.as_deref(), Some(HEX_KEY));
    assert_eq!(config.nostr.relays, vec!["wss://relay.one", "wss://relay.two"]);
    assert!(config.nostr.dry_run);
    assert_eq!(config.filter.rate_limit_max, 2);
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.daemon.log_level, "debug");
    assert!(!config.prometheus.enabled);
}

/// Sections that are omitted keep their defaults.
#[test]
fn partial_toml_keeps_defaults() {
    let toml = r##"
[irc]
channel = "#blocks"
"##;
    let config = load_config_from_str(toml).unwrap();
    let defaults = BridgeConfig::default();
    assert_eq!(config.irc.channel, "#blocks");
    assert_eq!(config.irc.server, defaults.irc.server);
    assert_eq!(config.nostr.relays, defaults.nostr.relays);
    assert_eq!(config.filter.rate_limit_max, 5);
}

/// Unknown field in [irc] produces an error mentioning it.
#[test]
fn unknown_field_in_irc_produces_error() {
    let toml = r##"
[irc]
chanel = "#typo"
"##;
    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("chanel"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown field is converted into an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_yields_suggestion_diagnostic() {
    let toml = format!(
        r#"
[nostr]
secret_key = "{HEX_KEY}"
dry_rn = true
"#
    );
    let errors = load_and_validate_str(&toml).expect_err("should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. } if key == "dry_rn" && s == "dry_run"
    )));
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Wrong value type is reported as InvalidType.
#[test]
fn wrong_type_reports_invalid_type() {
    let toml = r#"
[irc]
port = "six thousand"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))));
}

/// A config without a signing key fails validation (fatal at startup).
#[test]
fn missing_signing_key_is_fatal() {
    let errors = load_and_validate_str("").expect_err("secret key is required");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::MissingKey { key } if key == "nostr.secret_key")));
}

/// Full load-and-validate path succeeds with a key and defaults elsewhere.
#[test]
fn load_and_validate_accepts_minimal_config() {
    let toml = format!("[nostr]\nsecret_key = \"{HEX_KEY}\"\n");
    let config = load_and_validate_str(&toml).expect("minimal config is valid");
    assert_eq!(config.nostr.relays.len(), 5);
}

/// Environment variables override file values through the explicit key mapping.
#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "bridge.toml",
            r##"
[irc]
target_sender = "FromFile"
channel = "#file"
"##,
        )?;
        jail.set_env("IRCNOSTR_IRC_TARGET_SENDER", "FromEnv");
        jail.set_env("IRCNOSTR_NOSTR_DRY_RUN", "true");
        jail.set_env("IRCNOSTR_FILTER_RATE_LIMIT_MAX", "9");

        let config = load_config_from_path(std::path::Path::new("bridge.toml"))?;
        assert_eq!(config.irc.target_sender, "FromEnv");
        assert_eq!(config.irc.channel, "#file");
        assert!(config.nostr.dry_run);
        assert_eq!(config.filter.rate_limit_max, 9);
        Ok(())
    });
}

#[test]
fn suggest_key_is_public_for_callers() {
    assert_eq!(
        suggest_key("target_sendr", &["target_sender", "channel"]),
        Some("target_sender".to_string())
    );
}

/// Every section is reachable from the environment, including the signing key.
#[test]
fn env_overrides_reach_every_section() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("bridge.toml", "")?;
        jail.set_env("IRCNOSTR_NOSTR_SECRET_KEY", HEX_KEY);
        jail.set_env("IRCNOSTR_GATEWAY_PORT", "8181");
        jail.set_env("IRCNOSTR_DAEMON_LOG_LEVEL", "trace");
        jail.set_env("IRCNOSTR_PROMETHEUS_ENABLED", "false");
        jail.set_env("IRCNOSTR_IRC_MAX_RECONNECT_ATTEMPTS", "2");

        let config = load_config_from_path(std::path::Path::new("bridge.toml"))?;
        assert_eq!(config.nostr.secret_key.as_deref(), Some(HEX_KEY));
        assert_eq!(config.gateway.port, 8181);
        assert_eq!(config.daemon.log_level, "trace");
        assert!(!config.prometheus.enabled);
        assert_eq!(config.irc.max_reconnect_attempts, 2);
        Ok(())
    });
}

/// A variable naming no known section is still rejected.
#[test]
fn env_var_outside_known_sections_is_rejected() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("bridge.toml", "")?;
        jail.set_env("IRCNOSTR_TELEGRAM_TOKEN", "abc");

        assert!(load_config_from_path(std::path::Path::new("bridge.toml")).is_err());
        Ok(())
    });
}
