//! Seam to the external ledger that actually moves funds.
//!
//! The proof core never settles anything itself. Payers settle through a
//! [`Ledger`] implementation first, then mint a proof; [`pay_and_prove`] runs
//! the two steps together and folds the resulting transaction signature into
//! the proof's metadata.

use bon::Builder;
use serde_json::json;
use solana_pubkey::Pubkey;
use solana_signer::Signer;

use crate::{
    errors::Error,
    protocol::X402Protocol,
    types::{PaymentProof, PaymentRequest},
};

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Platform fee taken on settlement, in basis points of [`FEE_DENOMINATOR`].
///
/// Informative for ledger implementations; the proof protocol itself never
/// applies it.
pub const PLATFORM_FEE_BPS: u64 = 200;

/// Denominator for [`PLATFORM_FEE_BPS`].
pub const FEE_DENOMINATOR: u64 = 10_000;

pub fn sol_to_lamports(amount: f64) -> u64 {
    (amount * LAMPORTS_PER_SOL as f64) as u64
}

/// Fee the platform retains from `amount` lamports.
pub fn platform_fee(amount: u64) -> u64 {
    ((amount as u128 * PLATFORM_FEE_BPS as u128) / FEE_DENOMINATOR as u128) as u64
}

/// What the recipient receives from `amount` lamports after the platform fee.
pub fn net_of_fee(amount: u64) -> u64 {
    amount - platform_fee(amount)
}

/// A settlement instruction handed to the ledger collaborator.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct TipPayment {
    /// Destination account.
    pub recipient: Pubkey,
    /// Amount to move, in lamports.
    pub amount_lamports: u64,
    /// Optional tip message recorded alongside the payment.
    #[builder(into)]
    pub message: Option<String>,
}

/// External ledger collaborator: submits payments and answers balance queries.
///
/// Implementations do the actual on-chain work; the proof core only consumes
/// the resulting transaction signature.
pub trait Ledger {
    type Error: std::error::Error;

    /// Submit a payment, returning the transaction signature.
    fn submit_payment(
        &self,
        payment: &TipPayment,
    ) -> impl Future<Output = Result<String, Self::Error>>;

    /// Current balance of `identity`, in lamports.
    fn balance(&self, identity: &Pubkey) -> impl Future<Output = Result<u64, Self::Error>>;
}

#[derive(Debug, thiserror::Error)]
pub enum PayError<L: Ledger> {
    #[error("Ledger error: {0}")]
    Ledger(L::Error),

    #[error("Proof error: {0}")]
    Proof(#[from] Error),
}

/// Settle a challenge through the ledger, then mint the matching proof.
///
/// The transaction signature is folded into the proof metadata under
/// `"transaction"`, so it is covered by the proof's own signature. Returns
/// the proof together with the transaction signature. The challenge is
/// validated first; a malformed one is rejected before anything reaches the
/// ledger.
pub async fn pay_and_prove<L: Ledger>(
    ledger: &L,
    signer: &impl Signer,
    protocol: &X402Protocol,
    request: &PaymentRequest,
) -> Result<(PaymentProof, String), PayError<L>> {
    let recipient: Pubkey = request
        .recipient
        .parse()
        .map_err(|_| Error::InvalidIdentity(request.recipient.clone()))?;
    if !(request.amount > 0.0) {
        return Err(Error::NonPositiveAmount {
            amount: request.amount,
        }
        .into());
    }

    let payment = TipPayment::builder()
        .recipient(recipient)
        .amount_lamports(sol_to_lamports(request.amount))
        .maybe_message(request.message.clone())
        .build();
    let transaction = ledger
        .submit_payment(&payment)
        .await
        .map_err(PayError::Ledger)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "Payment settled: recipient='{recipient}', transaction='{transaction}'"
    );

    let mut metadata = request.metadata.clone().unwrap_or_default();
    metadata.insert("transaction".to_string(), json!(transaction));
    let proof = protocol.generate_proof(signer, &recipient, request.amount, Some(metadata))?;

    Ok((proof, transaction))
}
