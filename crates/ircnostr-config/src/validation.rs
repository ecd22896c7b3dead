// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: non-empty identities, channel prefixes, relay URL schemes,
//! non-zero limits, and the shape of the signing key.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::BridgeConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first one.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_irc(config, &mut errors);
    validate_nostr(config, &mut errors);

    if config.filter.rate_limit_max == 0 {
        errors.push(ConfigError::validation(
            "filter.rate_limit_max must be at least 1",
        ));
    }
    if config.filter.rate_limit_window_secs == 0 {
        errors.push(ConfigError::validation(
            "filter.rate_limit_window_secs must be at least 1",
        ));
    }

    if config.gateway.enabled && config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_irc(config: &BridgeConfig, errors: &mut Vec<ConfigError>) {
    let irc = &config.irc;

    for (key, value) in [
        ("irc.server", &irc.server),
        ("irc.nickname", &irc.nickname),
        ("irc.target_sender", &irc.target_sender),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{key} must not be empty")));
        } else if value.chars().any(char::is_whitespace) {
            errors.push(ConfigError::validation(format!(
                "{key} `{value}` must not contain whitespace"
            )));
        }
    }

    if !irc.channel.starts_with(['#', '&']) || irc.channel.len() < 2 {
        errors.push(ConfigError::validation(format!(
            "irc.channel `{}` must start with `#` or `&`",
            irc.channel
        )));
    }

    if irc.port == 0 {
        errors.push(ConfigError::validation("irc.port must not be 0"));
    }

    for (key, value) in [
        ("irc.keepalive_secs", irc.keepalive_secs),
        ("irc.connect_timeout_secs", irc.connect_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!("{key} must be at least 1")));
        }
    }
}

fn validate_nostr(config: &BridgeConfig, errors: &mut Vec<ConfigError>) {
    let nostr = &config.nostr;

    match nostr.secret_key.as_deref().map(str::trim) {
        None | Some("") => errors.push(ConfigError::MissingKey {
            key: "nostr.secret_key".to_string(),
        }),
        Some(key) if !looks_like_secret_key(key) => errors.push(ConfigError::validation(
            "nostr.secret_key must be an `nsec1` bech32 string or 64 hex characters",
        )),
        Some(_) => {}
    }

    if nostr.relays.is_empty() {
        errors.push(ConfigError::validation(
            "nostr.relays must list at least one relay",
        ));
    }

    let mut seen = HashSet::new();
    for relay in &nostr.relays {
        match url::Url::parse(relay) {
            Ok(url) if matches!(url.scheme(), "ws" | "wss") && url.host().is_some() => {}
            _ => errors.push(ConfigError::validation(format!(
                "nostr.relays entry `{relay}` is not a ws:// or wss:// URL"
            ))),
        }
        if !seen.insert(relay.trim_end_matches('/')) {
            errors.push(ConfigError::validation(format!(
                "duplicate relay `{relay}` in nostr.relays"
            )));
        }
    }

    if nostr.publish_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "nostr.publish_timeout_secs must be at least 1",
        ));
    }
}

/// Shape check only; the publisher performs the cryptographic parse.
fn looks_like_secret_key(key: &str) -> bool {
    let is_hex = key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit());
    let is_nsec = key.starts_with("nsec1")
        && key.len() == 63
        && key[5..].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    is_hex || is_nsec
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX_KEY: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

    fn valid_config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.nostr.secret_key = Some(HEX_KEY.to_string());
        config
    }

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains(needle)),
        )
    }

    #[test]
    fn default_config_with_key_validates() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn missing_secret_key_is_reported() {
        let errors = validate_config(&BridgeConfig::default()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key == "nostr.secret_key")));
    }

    #[test]
    fn malformed_secret_key_is_reported() {
        let mut config = valid_config();
        config.nostr.secret_key = Some("not-a-key".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "nostr.secret_key"));
    }

    #[test]
    fn nsec_shape_is_accepted() {
        assert!(looks_like_secret_key(
            "nsec1vl029mgpspedva04g90vltkh6fvh240zqtv9k0t9af8935ke9laqsnlfe5"
        ));
        assert!(!looks_like_secret_key("nsec1short"));
    }

    #[test]
    fn channel_without_prefix_fails_validation() {
        let mut config = valid_config();
        config.irc.channel = "bitcoin".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "irc.channel"));
    }

    #[test]
    fn http_relay_fails_validation() {
        let mut config = valid_config();
        config.nostr.relays = vec!["https://relay.example.com".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "not a ws:// or wss:// URL"));
    }

    #[test]
    fn duplicate_relays_fail_validation() {
        let mut config = valid_config();
        config.nostr.relays = vec![
            "wss://relay.example.com".into(),
            "wss://relay.example.com/".into(),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "duplicate relay"));
    }

    #[test]
    fn zero_rate_limit_fails_validation() {
        let mut config = valid_config();
        config.filter.rate_limit_max = 0;
        config.filter.rate_limit_window_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "rate_limit_max"));
        assert!(has_message(&errors, "rate_limit_window_secs"));
    }

    #[test]
    fn empty_target_sender_fails_validation() {
        let mut config = valid_config();
        config.irc.target_sender = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "irc.target_sender must not be empty"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = BridgeConfig::default();
        config.irc.channel = "nochan".into();
        config.nostr.relays.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
