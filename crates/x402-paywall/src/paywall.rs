use std::fmt::Display;

use bon::Builder;
use http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use solana_pubkey::Pubkey;
use x402_proof::{
    codec::AuthorizationHeader,
    protocol::{CURRENCY, DEFAULT_ACCEPTED_CURRENCIES, X402Protocol},
    types::PaymentProof,
};

use crate::errors::{PayWallErrorResponse, PaymentRequiredBody};

/// An HTTP paywall gating one protected resource behind an x402 proof.
///
/// Configuration is immutable for the lifetime of the instance; create one
/// paywall per resource and price point.
#[derive(Builder, Debug, Clone)]
pub struct PayWall {
    /// Identity payments must be made to.
    pub recipient: Pubkey,
    /// Price per invocation, in SOL.
    pub price: f64,
    /// Protocol configuration used for challenges and verification.
    #[builder(default)]
    pub protocol: X402Protocol,
    /// Currencies advertised in the challenge.
    #[builder(default = DEFAULT_ACCEPTED_CURRENCIES.map(String::from).to_vec())]
    pub accepted_currencies: Vec<String>,
}

/// The verified proof, attached to the request for downstream handlers.
#[derive(Debug, Clone)]
pub struct VerifiedPayment(pub PaymentProof);

impl PayWall {
    /// Gate `handler` behind a payment proof carried in the `Authorization`
    /// header of `request`.
    ///
    /// On admission the verified proof is inserted into the request
    /// extensions as [`VerifiedPayment`] and `handler` runs exactly once,
    /// its response passed through unchanged. Every rejection is a
    /// [`PayWallErrorResponse`]; nothing here moves funds or touches a
    /// ledger.
    pub async fn handle_payment<Fun, Fut, Req, Res>(
        &self,
        mut request: Request<Req>,
        handler: Fun,
    ) -> Result<Response<Res>, PayWallErrorResponse>
    where
        Fun: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Response<Res>>,
    {
        let Some(authorization) = request.headers().get(http::header::AUTHORIZATION) else {
            return Err(self.payment_required());
        };

        let header = authorization
            .to_str()
            .map(|value| AuthorizationHeader(value.to_string()))
            .map_err(|err| {
                self.invalid_payment(format!("Failed to read Authorization header: {err}"))
            })?;

        let proof = PaymentProof::try_from(header).map_err(|err| {
            self.invalid_payment(format!("Could not parse x402 payment proof: {err}"))
        })?;

        self.protocol
            .verify_proof(&proof)
            .map_err(|err| self.payment_failed(err))?;

        if proof.recipient != self.recipient.to_string() {
            return Err(self.payment_failed(format!(
                "proof pays `{}`, not this resource's recipient",
                proof.recipient
            )));
        }
        if proof.amount < self.price {
            return Err(self.payment_failed(format!(
                "proof amount {} is below the price of {} {CURRENCY}",
                proof.amount, self.price
            )));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Payment admitted: payer='{}', proof='{proof}'", proof.sender);

        request.extensions_mut().insert(VerifiedPayment(proof));
        Ok(handler(request).await)
    }

    /// Payment needed to access this resource.
    pub fn payment_required(&self) -> PayWallErrorResponse {
        PayWallErrorResponse {
            status: StatusCode::PAYMENT_REQUIRED,
            headers: self.challenge_headers(),
            body: PaymentRequiredBody {
                error: "Payment Required".to_string(),
                message: "This API requires payment via x402 protocol".to_string(),
                amount: Some(format!("{} {CURRENCY}", self.price)),
                recipient: Some(self.recipient.to_string()),
            },
        }
    }

    /// Malformed proof encoding.
    pub fn invalid_payment(&self, reason: impl Display) -> PayWallErrorResponse {
        PayWallErrorResponse {
            status: StatusCode::BAD_REQUEST,
            headers: Vec::new(),
            body: PaymentRequiredBody {
                error: "Invalid Payment Proof".to_string(),
                message: reason.to_string(),
                amount: None,
                recipient: None,
            },
        }
    }

    /// Proof decoded but failed verification or pays the wrong terms.
    pub fn payment_failed(&self, reason: impl Display) -> PayWallErrorResponse {
        PayWallErrorResponse {
            status: StatusCode::PAYMENT_REQUIRED,
            headers: self.challenge_headers(),
            body: PaymentRequiredBody {
                error: "Invalid Payment".to_string(),
                message: reason.to_string(),
                amount: Some(format!("{} {CURRENCY}", self.price)),
                recipient: Some(self.recipient.to_string()),
            },
        }
    }

    /// The challenge header set for this resource, as http header pairs.
    fn challenge_headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let headers = match self
            .protocol
            .build_challenge_headers()
            .recipient(self.recipient)
            .amount(self.price)
            .accepted_currencies(self.accepted_currencies.clone())
            .call()
        {
            Ok(headers) => headers,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to build challenge headers: {_err}; sending none");
                return Vec::new();
            }
        };

        headers
            .into_iter()
            .filter_map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
                let value = HeaderValue::from_str(&value).ok()?;
                Some((name, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use solana_keypair::Keypair;
    use x402_proof::{
        codec::PaymentRequiredHeader,
        protocol::now_millis,
        types::PaymentRequest,
    };

    use super::*;

    fn paywall(recipient: Pubkey) -> PayWall {
        PayWall::builder().recipient(recipient).price(0.1).build()
    }

    fn find_header<'a>(
        rejection: &'a PayWallErrorResponse,
        name: &str,
    ) -> Option<&'a HeaderValue> {
        rejection
            .headers
            .iter()
            .find_map(|(n, v)| (n.as_str() == name).then_some(v))
    }

    #[tokio::test]
    async fn missing_proof_yields_a_decodable_challenge() {
        let recipient = Pubkey::new_unique();
        let paywall = paywall(recipient);
        let calls = AtomicUsize::new(0);

        let request = Request::builder().uri("/premium").body(()).unwrap();
        let rejection = paywall
            .handle_payment(request, |_req| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Response::new("ok") }
            })
            .await
            .unwrap_err();

        assert_eq!(rejection.status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(rejection.body.error, "Payment Required");
        assert_eq!(rejection.body.amount.as_deref(), Some("0.1 SOL"));

        let www_authenticate = find_header(&rejection, "www-authenticate").unwrap();
        let challenge =
            PaymentRequiredHeader(www_authenticate.to_str().unwrap().to_string());
        let terms = PaymentRequest::try_from(challenge).unwrap();
        assert_eq!(terms.recipient, recipient.to_string());
        assert_eq!(terms.amount, 0.1);
        let expiry = terms.expiry.unwrap();
        assert!(expiry > now_millis() + 240_000);
        assert!(expiry <= now_millis() + 300_000);

        assert_eq!(
            find_header(&rejection, "accept-payment")
                .unwrap()
                .to_str()
                .unwrap(),
            "SOL, USDC"
        );
        assert_eq!(
            find_header(&rejection, "payment-recipient")
                .unwrap()
                .to_str()
                .unwrap(),
            recipient.to_string()
        );
    }

    #[tokio::test]
    async fn valid_proof_is_admitted_and_attached() {
        let keypair = Keypair::new();
        let recipient = Pubkey::new_unique();
        let paywall = paywall(recipient);
        let calls = AtomicUsize::new(0);

        let proof = paywall
            .protocol
            .generate_proof(&keypair, &recipient, 0.1, None)
            .unwrap();
        let header = AuthorizationHeader::try_from(proof.clone()).unwrap();

        let request = Request::builder()
            .uri("/premium")
            .header(http::header::AUTHORIZATION, header.0)
            .body(())
            .unwrap();

        let response = paywall
            .handle_payment(request, |req| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let attached = req.extensions().get::<VerifiedPayment>().unwrap();
                    Response::new(attached.0.sender.clone())
                }
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.body(), &proof.sender);
    }

    #[tokio::test]
    async fn undecodable_proof_is_a_client_error() {
        let paywall = paywall(Pubkey::new_unique());

        let request = Request::builder()
            .uri("/premium")
            .header(http::header::AUTHORIZATION, "x402 %%not-base64%%")
            .body(())
            .unwrap();

        let rejection = paywall
            .handle_payment(request, |_req| async { Response::new("ok") })
            .await
            .unwrap_err();

        assert_eq!(rejection.status, StatusCode::BAD_REQUEST);
        assert_eq!(rejection.body.error, "Invalid Payment Proof");
        assert!(rejection.headers.is_empty());
    }

    #[tokio::test]
    async fn wrong_recipient_or_short_payment_is_rejected() {
        let keypair = Keypair::new();
        let recipient = Pubkey::new_unique();
        let paywall = paywall(recipient);

        // Valid proof, but paying someone else.
        let elsewhere = Pubkey::new_unique();
        let proof = paywall
            .protocol
            .generate_proof(&keypair, &elsewhere, 0.1, None)
            .unwrap();
        let header = AuthorizationHeader::try_from(proof).unwrap();
        let request = Request::builder()
            .uri("/premium")
            .header(http::header::AUTHORIZATION, header.0)
            .body(())
            .unwrap();
        let rejection = paywall
            .handle_payment(request, |_req| async { Response::new("ok") })
            .await
            .unwrap_err();
        assert_eq!(rejection.status, StatusCode::PAYMENT_REQUIRED);
        assert!(rejection.body.message.contains("recipient"));

        // Valid proof, but below the price.
        let proof = paywall
            .protocol
            .generate_proof(&keypair, &recipient, 0.05, None)
            .unwrap();
        let header = AuthorizationHeader::try_from(proof).unwrap();
        let request = Request::builder()
            .uri("/premium")
            .header(http::header::AUTHORIZATION, header.0)
            .body(())
            .unwrap();
        let rejection = paywall
            .handle_payment(request, |_req| async { Response::new("ok") })
            .await
            .unwrap_err();
        assert_eq!(rejection.status, StatusCode::PAYMENT_REQUIRED);
        assert!(rejection.body.message.contains("below the price"));
    }
}
