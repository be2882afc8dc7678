//! Protocol-level operations for negotiating and validating x402 payments.
//!
//! Per-proof lifecycle: `Unsigned -> Signed -> {Valid, Invalid, Expired}`.
//! Construction always signs, verification is terminal, and there is no retry
//! inside the protocol; the application retries by minting a new proof.

use std::time::{SystemTime, UNIX_EPOCH};

use bon::{Builder, bon};
use solana_pubkey::Pubkey;
use solana_signer::Signer;

use crate::{
    codec::PaymentRequiredHeader,
    errors::{Error, Result, VerifyError},
    signer,
    types::{AnyJson, PaymentProof, PaymentRequest, Record},
};

/// Exact version string a proof must carry.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Currency proofs are denominated in.
pub const CURRENCY: &str = "SOL";

/// Default maximum proof age at verification time, in milliseconds.
pub const FRESHNESS_WINDOW_MS: u64 = 300_000;

/// Currencies advertised in challenge headers by default.
pub const DEFAULT_ACCEPTED_CURRENCIES: [&str; 2] = ["SOL", "USDC"];

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Stateless protocol handle.
///
/// Holds only immutable configuration and is safe to share across threads.
/// Replay exposure is bounded solely by the freshness window; there is no
/// cross-request nonce store. Callers operating across untrusted clocks
/// should widen the window to cover the expected skew.
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct X402Protocol {
    /// Maximum accepted proof age in milliseconds.
    #[builder(default = FRESHNESS_WINDOW_MS)]
    pub freshness_window_ms: u64,
}

impl Default for X402Protocol {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl X402Protocol {
    /// Mint a signed proof that `signer` paid `amount` to `recipient` now.
    ///
    /// Stamps the current time, draws a fresh 16-byte CSPRNG nonce and signs
    /// the canonical payload. Does not contact any ledger.
    pub fn generate_proof(
        &self,
        signer: &impl Signer,
        recipient: &Pubkey,
        amount: f64,
        metadata: Option<Record<AnyJson>>,
    ) -> Result<PaymentProof> {
        if !(amount > 0.0) {
            return Err(Error::NonPositiveAmount { amount });
        }

        let mut proof = PaymentProof {
            version: PROTOCOL_VERSION.to_string(),
            timestamp: now_millis(),
            sender: signer.try_pubkey()?.to_string(),
            recipient: recipient.to_string(),
            amount,
            currency: CURRENCY.to_string(),
            nonce: generate_nonce(),
            signature: String::new(),
            metadata: metadata.unwrap_or_default(),
        };
        proof.signature = signer::sign_proof(&proof, signer)?.to_string();

        #[cfg(feature = "tracing")]
        tracing::debug!("Generated payment proof: {proof}");

        Ok(proof)
    }

    /// Verify a proof against the current wall clock.
    pub fn verify_proof(&self, proof: &PaymentProof) -> std::result::Result<(), VerifyError> {
        self.verify_proof_at(now_millis(), proof)
    }

    /// Verify a proof against an explicit clock.
    ///
    /// Checks run cheapest-first so the reported reason is the earliest
    /// failure, but every check is mandatory; none is skipped because another
    /// passed.
    pub fn verify_proof_at(
        &self,
        now_ms: u64,
        proof: &PaymentProof,
    ) -> std::result::Result<(), VerifyError> {
        if proof.version != PROTOCOL_VERSION {
            return Err(VerifyError::InvalidVersion);
        }
        if now_ms.saturating_sub(proof.timestamp) > self.freshness_window_ms {
            return Err(VerifyError::Expired);
        }
        if proof.sender.is_empty() {
            return Err(VerifyError::MissingField("sender"));
        }
        if proof.recipient.is_empty() {
            return Err(VerifyError::MissingField("recipient"));
        }
        if !(proof.amount > 0.0) {
            return Err(VerifyError::MissingField("amount"));
        }
        if proof.nonce.is_empty() {
            return Err(VerifyError::MissingField("nonce"));
        }
        if proof.signature.is_empty() {
            return Err(VerifyError::MissingField("signature"));
        }
        if !signer::verify_proof_signature(proof) {
            return Err(VerifyError::BadSignature);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Verified payment proof: {proof}");

        Ok(())
    }

    /// Case-insensitive `WWW-Authenticate` lookup and decode.
    ///
    /// Returns `None` when the header is absent, undecodable or expired.
    pub fn extract_challenge(&self, headers: &Record<String>) -> Option<PaymentRequest> {
        let value = headers
            .iter()
            .find_map(|(name, value)| name.eq_ignore_ascii_case("www-authenticate").then_some(value))?;
        PaymentRequiredHeader(value.clone()).decode_at(now_millis()).ok()
    }
}

#[bon]
impl X402Protocol {
    /// Build the terms a gated resource demands before granting access.
    ///
    /// Expiry defaults to five minutes from now.
    #[builder]
    pub fn create_payment_request(
        &self,
        recipient: Pubkey,
        amount: f64,
        #[builder(into)] message: Option<String>,
        #[builder(default = 5)] expiry_minutes: u64,
        metadata: Option<Record<AnyJson>>,
    ) -> Result<PaymentRequest> {
        if !(amount > 0.0) {
            return Err(Error::NonPositiveAmount { amount });
        }
        Ok(PaymentRequest::builder()
            .recipient(recipient.to_string())
            .amount(amount)
            .maybe_message(message)
            .expiry(now_millis() + expiry_minutes * 60_000)
            .maybe_metadata(metadata)
            .build())
    }

    /// The response headers a gated resource returns with its 402.
    ///
    /// Pure function of its inputs: an authenticate-style header carrying the
    /// encoded challenge, the accepted currency list, and human-readable
    /// amount/recipient headers for client convenience.
    #[builder]
    pub fn build_challenge_headers(
        &self,
        recipient: Pubkey,
        amount: f64,
        #[builder(default = DEFAULT_ACCEPTED_CURRENCIES.map(String::from).to_vec())]
        accepted_currencies: Vec<String>,
    ) -> Result<Record<String>> {
        let request = self
            .create_payment_request()
            .recipient(recipient)
            .amount(amount)
            .call()?;
        let challenge = PaymentRequiredHeader::try_from(request)?;

        let mut headers = Record::new();
        headers.insert("WWW-Authenticate".to_string(), challenge.0);
        headers.insert("Accept-Payment".to_string(), accepted_currencies.join(", "));
        headers.insert("Payment-Amount".to_string(), format!("{amount} {CURRENCY}"));
        headers.insert("Payment-Recipient".to_string(), recipient.to_string());
        Ok(headers)
    }
}

/// 16 bytes from the thread-local CSPRNG, hex encoded.
fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}
