//! Payer-side walkthrough: read a 402 challenge, settle through a ledger,
//! mint a proof and verify it the way a payee would.

use std::convert::Infallible;

use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use x402_proof::{
    codec::AuthorizationHeader,
    ledger::{Ledger, TipPayment, pay_and_prove},
    protocol::X402Protocol,
};

/// Stand-in for a real on-chain client.
#[derive(Debug)]
struct DemoLedger;

impl Ledger for DemoLedger {
    type Error = Infallible;

    async fn submit_payment(&self, payment: &TipPayment) -> Result<String, Self::Error> {
        println!(
            "ledger: sending {} lamports to {}",
            payment.amount_lamports, payment.recipient
        );
        Ok("5KtP3qDemoTransactionSignature".to_string())
    }

    async fn balance(&self, _identity: &Pubkey) -> Result<u64, Self::Error> {
        Ok(1_000_000_000)
    }
}

#[tokio::main]
async fn main() {
    let protocol = X402Protocol::default();
    let payer = Keypair::new();
    let creator = Pubkey::new_unique();

    // The payee side of the exchange: challenge headers for a 0.1 SOL resource.
    let headers = protocol
        .build_challenge_headers()
        .recipient(creator)
        .amount(0.1)
        .call()
        .expect("challenge headers");

    // The payer side: read the terms, pay, prove.
    let terms = protocol
        .extract_challenge(&headers)
        .expect("decodable challenge");
    println!("challenge: pay {} SOL to {}", terms.amount, terms.recipient);

    let (proof, transaction) = pay_and_prove(&DemoLedger, &payer, &protocol, &terms)
        .await
        .expect("payment and proof");
    println!("settled as {transaction}");
    println!("proof: {proof}");

    let header = AuthorizationHeader::try_from(proof.clone()).expect("encodable proof");
    println!("Authorization: {header}");

    // Back on the payee side.
    protocol.verify_proof(&proof).expect("proof verifies");
    println!("verified");
}
