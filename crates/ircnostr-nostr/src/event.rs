// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NIP-01 text notes.
//!
//! The event id is the sha256 of the canonical array
//! `[0, pubkey, created_at, kind, tags, content]`; the signature is a BIP-340
//! Schnorr signature over that id.

use ircnostr_core::error::BridgeError;
use ircnostr_core::types::{OutboundPost, SignedEvent};
use secp256k1::{schnorr, Message, XOnlyPublicKey, SECP256K1};
use sha2::{Digest, Sha256};

use crate::keys::SigningKeys;

/// Short text note.
pub const TEXT_NOTE_KIND: u16 = 1;

/// Builds and signs the kind-1 note for a post.
///
/// Content is the post text followed by one hashtag per tag; each tag is
/// also carried as a `["t", tag]` entry.
pub fn sign_post(post: &OutboundPost, keys: &SigningKeys) -> Result<SignedEvent, BridgeError> {
    let tags = post
        .tags
        .iter()
        .map(|tag| vec!["t".to_string(), tag.clone()])
        .collect();
    let created_at = u64::try_from(post.created_at.timestamp()).unwrap_or_default();
    sign_event(keys, created_at, TEXT_NOTE_KIND, tags, post.rendered_content())
}

pub fn sign_event(
    keys: &SigningKeys,
    created_at: u64,
    kind: u16,
    tags: Vec<Vec<String>>,
    content: String,
) -> Result<SignedEvent, BridgeError> {
    let pubkey = keys.public_key_hex().to_string();
    let digest = event_digest(&pubkey, created_at, kind, &tags, &content)?;

    let message = Message::from_digest_slice(&digest)
        .map_err(|e| BridgeError::Signing(format!("invalid digest: {e}")))?;
    let sig = SECP256K1.sign_schnorr_no_aux_rand(&message, keys.keypair());

    Ok(SignedEvent {
        id: hex::encode(digest),
        pubkey,
        created_at,
        kind,
        tags,
        content,
        sig: hex::encode(sig.serialize()),
    })
}

/// Canonical JSON serialization used for the id.
pub fn canonical_json(
    pubkey: &str,
    created_at: u64,
    kind: u16,
    tags: &[Vec<String>],
    content: &str,
) -> Result<String, BridgeError> {
    serde_json::to_string(&(0, pubkey, created_at, kind, tags, content))
        .map_err(|e| BridgeError::Signing(format!("event serialization failed: {e}")))
}

fn event_digest(
    pubkey: &str,
    created_at: u64,
    kind: u16,
    tags: &[Vec<String>],
    content: &str,
) -> Result<[u8; 32], BridgeError> {
    let json = canonical_json(pubkey, created_at, kind, tags, content)?;
    Ok(Sha256::digest(json.as_bytes()).into())
}

/// Checks both the id and the signature of an event.
pub fn verify_event(event: &SignedEvent) -> Result<bool, BridgeError> {
    let digest = event_digest(
        &event.pubkey,
        event.created_at,
        event.kind,
        &event.tags,
        &event.content,
    )?;
    if hex::encode(digest) != event.id {
        return Ok(false);
    }

    let sig_bytes =
        hex::decode(&event.sig).map_err(|e| BridgeError::Signing(format!("invalid sig hex: {e}")))?;
    let sig = schnorr::Signature::from_slice(&sig_bytes)
        .map_err(|e| BridgeError::Signing(format!("invalid signature: {e}")))?;
    let pubkey_bytes = hex::decode(&event.pubkey)
        .map_err(|e| BridgeError::Signing(format!("invalid pubkey hex: {e}")))?;
    let pubkey = XOnlyPublicKey::from_slice(&pubkey_bytes)
        .map_err(|e| BridgeError::Signing(format!("invalid pubkey: {e}")))?;
    let message = Message::from_digest_slice(&digest)
        .map_err(|e| BridgeError::Signing(format!("invalid digest: {e}")))?;

    Ok(SECP256K1.verify_schnorr(&sig, &message, &pubkey).is_ok())
}
