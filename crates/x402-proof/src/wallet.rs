//! Explicitly-owned wallet context for autonomous tippers.
//!
//! An agent holds a signing key and a running daily-spend counter. Both live
//! in this context object, owned by whoever drives the agent loop; the
//! protocol core itself holds no such state.

use bon::Builder;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::{Signer, SignerError};

/// A signing identity paired with a daily spending ceiling.
///
/// Implements [`Signer`] by delegation, so it can be handed to
/// [`X402Protocol::generate_proof`](crate::protocol::X402Protocol::generate_proof)
/// or [`pay_and_prove`](crate::ledger::pay_and_prove) directly.
#[derive(Builder, Debug)]
pub struct AgentWallet<S: Signer> {
    /// The wallet's signing key.
    pub signer: S,
    /// Daily spend ceiling, in SOL.
    pub daily_budget: f64,
    #[builder(default = 0.0)]
    spent_today: f64,
}

/// A spend was refused because it would cross the daily ceiling.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("daily budget exceeded: spent {spent} of {budget} SOL, requested {requested}")]
pub struct BudgetExceeded {
    pub budget: f64,
    pub spent: f64,
    pub requested: f64,
}

impl<S: Signer> AgentWallet<S> {
    /// SOL still spendable today.
    pub fn remaining_budget(&self) -> f64 {
        (self.daily_budget - self.spent_today).max(0.0)
    }

    /// Record a spend, or refuse it if it would cross the daily ceiling.
    pub fn try_reserve(&mut self, amount: f64) -> Result<(), BudgetExceeded> {
        if amount > self.remaining_budget() {
            return Err(BudgetExceeded {
                budget: self.daily_budget,
                spent: self.spent_today,
                requested: amount,
            });
        }
        self.spent_today += amount;
        Ok(())
    }

    /// Start a new spending day.
    pub fn reset_day(&mut self) {
        self.spent_today = 0.0;
    }
}

impl<S: Signer> Signer for AgentWallet<S> {
    fn try_pubkey(&self) -> Result<Pubkey, SignerError> {
        self.signer.try_pubkey()
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        self.signer.try_sign_message(message)
    }

    fn is_interactive(&self) -> bool {
        self.signer.is_interactive()
    }
}
