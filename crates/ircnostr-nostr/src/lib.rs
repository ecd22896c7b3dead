// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nostr side of the bridge.
//!
//! Parses the signing key, turns approved posts into signed NIP-01 text
//! notes and fans them out to the configured relays.

pub mod event;
pub mod keys;
pub mod publisher;
pub mod sink;

pub use event::{sign_post, verify_event, TEXT_NOTE_KIND};
pub use keys::SigningKeys;
pub use publisher::FanoutPublisher;
pub use sink::WebSocketRelaySink;
