//! Ed25519 binding between a proof's canonical payload and its sender.
//!
//! The signed payload is the JSON serialization of every proof field except
//! the signature, in wire order, metadata included. Signing and verification
//! both derive the bytes from [`signing_bytes`], never from ad hoc
//! concatenation, so there is exactly one byte layout per proof.

use serde::Serialize;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;

use crate::{
    errors::Result,
    types::{AnyJson, PaymentProof, Record},
};

/// Canonical signed view of a proof.
///
/// Mirrors [`PaymentProof`]'s wire fields minus `signature`; keep the two in
/// sync, including the empty-metadata skip rule.
#[derive(Serialize)]
struct SigningPayload<'a> {
    version: &'a str,
    timestamp: u64,
    sender: &'a str,
    recipient: &'a str,
    amount: f64,
    currency: &'a str,
    nonce: &'a str,
    #[serde(skip_serializing_if = "metadata_is_empty")]
    metadata: &'a Record<AnyJson>,
}

fn metadata_is_empty(metadata: &&Record<AnyJson>) -> bool {
    metadata.is_empty()
}

impl<'a> From<&'a PaymentProof> for SigningPayload<'a> {
    fn from(proof: &'a PaymentProof) -> Self {
        SigningPayload {
            version: &proof.version,
            timestamp: proof.timestamp,
            sender: &proof.sender,
            recipient: &proof.recipient,
            amount: proof.amount,
            currency: &proof.currency,
            nonce: &proof.nonce,
            metadata: &proof.metadata,
        }
    }
}

/// The exact bytes a proof's signature must cover.
pub fn signing_bytes(proof: &PaymentProof) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&SigningPayload::from(proof))
}

/// Sign the canonical payload with the wallet seam.
///
/// The proof's existing `signature` field is ignored.
pub fn sign_proof(proof: &PaymentProof, signer: &impl Signer) -> Result<Signature> {
    let bytes = signing_bytes(proof)?;
    Ok(signer.try_sign_message(&bytes)?)
}

/// Check the proof's signature against its declared sender identity.
///
/// Returns `false` when the sender is not a base58 public key, the signature
/// is not a base58 ed25519 signature, or the signature does not cover exactly
/// the canonical payload bytes. Changing any signed field flips the result.
pub fn verify_proof_signature(proof: &PaymentProof) -> bool {
    let Ok(sender) = proof.sender.parse::<Pubkey>() else {
        return false;
    };
    let Ok(signature) = proof.signature.parse::<Signature>() else {
        return false;
    };
    let Ok(bytes) = signing_bytes(proof) else {
        return false;
    };
    signature.verify(sender.as_ref(), &bytes)
}
