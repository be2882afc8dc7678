//! Transport-safe header encodings for proofs and challenges.
//!
//! Both headers wrap base64-encoded JSON behind a fixed scheme tag:
//! `Authorization: x402 <base64(proof)>` and
//! `WWW-Authenticate: x402-payment-required:<base64(request)>`.
//! Encoding and decoding are side-effect-free and round-trip losslessly.

use std::fmt::Display;

use base64::{Engine, prelude::BASE64_STANDARD};

use crate::{
    errors::Error,
    protocol::now_millis,
    types::{PaymentProof, PaymentRequest},
};

/// Scheme prefix for proof-bearing `Authorization` headers.
pub const AUTHORIZATION_SCHEME: &str = "x402 ";

/// Scheme prefix for the `WWW-Authenticate` challenge header.
pub const PAYMENT_REQUIRED_SCHEME: &str = "x402-payment-required:";

/// An `Authorization` header value carrying an encoded [`PaymentProof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader(pub String);

impl Display for AuthorizationHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<PaymentProof> for AuthorizationHeader {
    type Error = serde_json::Error;

    fn try_from(value: PaymentProof) -> Result<Self, Self::Error> {
        let json = serde_json::to_string(&value)?;
        let encoded = BASE64_STANDARD.encode(json);
        Ok(AuthorizationHeader(format!(
            "{AUTHORIZATION_SCHEME}{encoded}"
        )))
    }
}

impl TryFrom<AuthorizationHeader> for PaymentProof {
    type Error = Error;

    fn try_from(value: AuthorizationHeader) -> Result<Self, Self::Error> {
        let encoded = value
            .0
            .strip_prefix(AUTHORIZATION_SCHEME)
            .ok_or(Error::SchemeMismatch {
                expected: AUTHORIZATION_SCHEME,
            })?;
        let decoded_bytes = BASE64_STANDARD.decode(encoded)?;
        let json_str = String::from_utf8(decoded_bytes)?;
        let proof = serde_json::from_str(&json_str)?;
        Ok(proof)
    }
}

/// A `WWW-Authenticate` header value carrying an encoded [`PaymentRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequiredHeader(pub String);

impl Display for PaymentRequiredHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<PaymentRequest> for PaymentRequiredHeader {
    type Error = serde_json::Error;

    fn try_from(value: PaymentRequest) -> Result<Self, Self::Error> {
        let json = serde_json::to_string(&value)?;
        let encoded = BASE64_STANDARD.encode(json);
        Ok(PaymentRequiredHeader(format!(
            "{PAYMENT_REQUIRED_SCHEME}{encoded}"
        )))
    }
}

impl PaymentRequiredHeader {
    /// Decode against an explicit clock, rejecting requests whose expiry has
    /// already passed.
    pub fn decode_at(&self, now_ms: u64) -> Result<PaymentRequest, Error> {
        let encoded =
            self.0
                .strip_prefix(PAYMENT_REQUIRED_SCHEME)
                .ok_or(Error::SchemeMismatch {
                    expected: PAYMENT_REQUIRED_SCHEME,
                })?;
        let decoded_bytes = BASE64_STANDARD.decode(encoded)?;
        let json_str = String::from_utf8(decoded_bytes)?;
        let request: PaymentRequest = serde_json::from_str(&json_str)?;

        if let Some(expiry) = request.expiry
            && now_ms > expiry
        {
            return Err(Error::ExpiredChallenge { expiry });
        }

        Ok(request)
    }
}

impl TryFrom<PaymentRequiredHeader> for PaymentRequest {
    type Error = Error;

    fn try_from(value: PaymentRequiredHeader) -> Result<Self, Self::Error> {
        value.decode_at(now_millis())
    }
}
