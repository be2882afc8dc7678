use std::fmt::Display;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::types::{AnyJson, Record};

/// A signed claim that `sender` paid `amount` to `recipient` at `timestamp`.
///
/// Field declaration order is the canonical wire order; the signature covers
/// every other field serialized in exactly this order, metadata included.
/// Proofs are immutable once signed and are discarded after verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentProof {
    /// Protocol version string, must match the verifier's exactly.
    pub version: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Base58-encoded public key of the payer.
    pub sender: String,
    /// Base58-encoded public key of the payee.
    pub recipient: String,
    /// Amount paid, in the protocol currency unit.
    pub amount: f64,
    /// Currency code, e.g. `SOL`.
    pub currency: String,
    /// Random per-proof value; uniqueness is not tracked across proofs.
    pub nonce: String,
    /// Base58-encoded ed25519 signature over the canonical payload.
    pub signature: String,
    /// Open key-value bag, covered by the signature.
    #[serde(default, skip_serializing_if = "Record::is_empty")]
    pub metadata: Record<AnyJson>,
}

impl Display for PaymentProof {
    /// Terse, non-reversible form for logs. Not used for verification.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x402_{}_{}_{}_{}_{}",
            self.timestamp, self.sender, self.recipient, self.amount, self.nonce
        )
    }
}

/// The terms a resource demands before granting access.
///
/// Created per unauthenticated request, encoded into the 402 response and
/// never stored; a request observed after its expiry is invalid.
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Base58-encoded public key of the payee.
    #[builder(into)]
    pub recipient: String,
    /// Amount demanded, in the protocol currency unit.
    pub amount: f64,
    /// Optional human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub message: Option<String>,
    /// Expiry time, milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    /// Open key-value bag for extensibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Record<AnyJson>>,
}
