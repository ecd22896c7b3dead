// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the ircnostr bridge.
//!
//! Provides the error types, the shared data model, and the traits at the
//! seams between the chat connection, the relay publisher and their
//! transports. Every other crate in the workspace builds on these.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BridgeError, TransportError, TransportErrorKind};
pub use types::{
    AdapterType, ConnectionState, DecisionReason, EndpointResult, HealthStatus,
    IncomingMessage, OutboundPost, PublishOutcome, RelayDecision, SignedEvent,
};

pub use traits::{
    PluginAdapter, RelaySink, TransportConnector, TransportEvent, TransportEvents,
    TransportLink, TransportSession,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_error_has_all_variants() {
        let _config = BridgeError::Config("test".into());
        let _transport = BridgeError::Transport(TransportError::new(
            TransportErrorKind::Io,
            "test",
        ));
        let _publish = BridgeError::Publish {
            endpoint: "wss://relay.example".into(),
            message: "test".into(),
        };
        let _signing = BridgeError::Signing("test".into());
        let _timeout = BridgeError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        let _internal = BridgeError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Channel,
            AdapterType::Publisher,
            AdapterType::Observability,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn connection_state_defaults_to_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_relay_sink<T: RelaySink>() {}
        fn _assert_transport_connector<T: TransportConnector>() {}
        fn _assert_transport_link<T: TransportLink>() {}
    }
}
