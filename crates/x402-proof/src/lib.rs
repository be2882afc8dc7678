//! # x402 Proof Protocol
//!
//! A compact proof-of-payment protocol for gating HTTP resources behind
//! micropayments, modeled on the `402 Payment Required` status code.
//!
//! A payer mints a [`PaymentProof`](types::PaymentProof): a signed claim that
//! "sender paid amount to recipient at time T with nonce N". A payee returns a
//! [`PaymentRequest`](types::PaymentRequest) challenge describing the terms it
//! demands, and later verifies attached proofs for version, freshness, field
//! completeness and an ed25519 signature over the canonical payload.
//!
//! All operations are synchronous, stateless across invocations and safe to
//! call concurrently; the only configuration is the freshness window on
//! [`X402Protocol`](protocol::X402Protocol). Actual fund movement is delegated
//! to the external [`Ledger`](ledger::Ledger) collaborator.
//!
//! ## Modules
//!
//! - [`types`]: The proof and challenge wire types.
//! - [`codec`]: Transport-safe header encodings (`x402 <base64>` and
//!   `x402-payment-required:<base64>`).
//! - [`signer`]: The canonical signed payload and its ed25519 binding.
//! - [`protocol`]: Proof generation, verification and the challenge lifecycle.
//! - [`ledger`]: The settlement seam and the payer-side pay-then-prove flow.
//! - [`wallet`]: An explicitly-owned agent wallet context with a daily budget.

pub mod codec;
pub mod errors;
pub mod ledger;
pub mod protocol;
pub mod signer;
pub mod types;
pub mod wallet;
