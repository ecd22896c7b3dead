// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ircnostr config`: print the effective configuration.

use ircnostr_config::model::BridgeConfig;

const REDACTED: &str = "[redacted]";

/// Renders the merged configuration as TOML with the signing key masked.
pub fn render_effective(config: &BridgeConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.nostr.secret_key.is_some() {
        shown.nostr.secret_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

    #[test]
    fn secret_key_is_masked() {
        let mut config = BridgeConfig::default();
        config.nostr.secret_key = Some(KEY.into());

        let text = render_effective(&config).unwrap();
        assert!(!text.contains(KEY));
        assert!(text.contains("[redacted]"));
        assert!(text.contains("[irc]"));
        assert!(text.contains("[nostr]"));
    }

    #[test]
    fn output_parses_back_as_config() {
        let text = render_effective(&BridgeConfig::default()).unwrap();
        let parsed: BridgeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.irc.port, BridgeConfig::default().irc.port);
    }
}
