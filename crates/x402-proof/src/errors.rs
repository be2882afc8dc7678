#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("UTF-8 decode error: {0}")]
    Utf8DecodeError(#[from] std::string::FromUtf8Error),

    #[error("Signer error: {0}")]
    SignerError(#[from] solana_signer::SignerError),

    #[error("Header scheme mismatch: expected `{expected}` prefix")]
    SchemeMismatch { expected: &'static str },

    #[error("Payment request expired at {expiry}")]
    ExpiredChallenge { expiry: u64 },

    #[error("Payment amount must be positive, got {amount}")]
    NonPositiveAmount { amount: f64 },

    #[error("`{0}` is not a base58 public key")]
    InvalidIdentity(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Verification-time failures, each independently distinguishable so that
/// callers can decide whether to retry with a fresh proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("proof version does not match the protocol version")]
    InvalidVersion,

    #[error("proof timestamp is outside the freshness window")]
    Expired,

    #[error("proof is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("proof signature does not verify against the sender identity")]
    BadSignature,
}
