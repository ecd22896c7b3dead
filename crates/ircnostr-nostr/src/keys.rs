// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signing key parsing.
//!
//! Accepts a NIP-19 `nsec1...` string or 64 hex characters. A key that does
//! not parse is a configuration error; the bridge refuses to start without
//! a usable key.

use bech32::{Bech32, Hrp};
use ircnostr_core::error::BridgeError;
use secp256k1::{Keypair, SecretKey, SECP256K1};

const NSEC_HRP: &str = "nsec";
const NPUB_HRP: &str = "npub";

/// The bridge's signing identity.
#[derive(Clone)]
pub struct SigningKeys {
    keypair: Keypair,
    public_hex: String,
}

impl SigningKeys {
    pub fn parse(input: &str) -> Result<Self, BridgeError> {
        let input = input.trim();
        let secret = if input.starts_with("nsec1") {
            decode_nsec(input)?
        } else {
            decode_hex(input)?
        };

        let secret = SecretKey::from_slice(&secret)
            .map_err(|e| BridgeError::Config(format!("nostr.secret_key is not a valid key: {e}")))?;
        let keypair = Keypair::from_secret_key(SECP256K1, &secret);
        let (xonly, _parity) = keypair.x_only_public_key();

        Ok(Self {
            keypair,
            public_hex: hex::encode(xonly.serialize()),
        })
    }

    /// Lowercase hex x-only public key, as used in event `pubkey` fields.
    pub fn public_key_hex(&self) -> &str {
        &self.public_hex
    }

    /// NIP-19 encoded public key, for operators.
    pub fn npub(&self) -> Result<String, BridgeError> {
        let hrp = Hrp::parse(NPUB_HRP).map_err(|e| BridgeError::Internal(e.to_string()))?;
        let (xonly, _parity) = self.keypair.x_only_public_key();
        bech32::encode::<Bech32>(hrp, &xonly.serialize())
            .map_err(|e| BridgeError::Internal(format!("npub encoding failed: {e}")))
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("public_key", &self.public_hex)
            .field("secret_key", &"[redacted]")
            .finish()
    }
}

fn decode_nsec(input: &str) -> Result<[u8; 32], BridgeError> {
    let (hrp, data) = bech32::decode(input)
        .map_err(|e| BridgeError::Config(format!("nostr.secret_key is not valid bech32: {e}")))?;
    if hrp.as_str() != NSEC_HRP {
        return Err(BridgeError::Config(format!(
            "nostr.secret_key has prefix `{hrp}`, expected `{NSEC_HRP}`"
        )));
    }
    to_key_bytes(&data)
}

fn decode_hex(input: &str) -> Result<[u8; 32], BridgeError> {
    let bytes = hex::decode(input).map_err(|e| {
        BridgeError::Config(format!("nostr.secret_key is neither nsec nor hex: {e}"))
    })?;
    to_key_bytes(&bytes)
}

fn to_key_bytes(bytes: &[u8]) -> Result<[u8; 32], BridgeError> {
    <[u8; 32]>::try_from(bytes).map_err(|_| {
        BridgeError::Config(format!(
            "nostr.secret_key must be 32 bytes, got {}",
            bytes.len()
        ))
    })
}
