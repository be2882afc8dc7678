use std::pin::Pin;

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::paywall::PayWall;

impl<S> Layer<S> for PayWall {
    type Service = PayWallService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PayWallService {
            paywall: self.clone(),
            inner,
        }
    }
}

/// Tower service produced by layering a [`PayWall`] over an inner service.
#[derive(Clone)]
pub struct PayWallService<S> {
    paywall: PayWall,
    inner: S,
}

impl<S> Service<Request> for PayWallService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: IntoResponse + Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let paywall = self.paywall.clone();
        // Take the service that was driven to readiness, leave the clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = paywall
                .handle_payment(request, move |req| async move {
                    inner
                        .call(req)
                        .await
                        .unwrap_or_else(|err| err.into_response())
                })
                .await
                .unwrap_or_else(|err| err.into_response());

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{Extension, Router, body::to_bytes, response::Response, routing::get};
    use http::{StatusCode, header};
    use solana_keypair::Keypair;
    use solana_pubkey::Pubkey;
    use tower::ServiceExt;
    use x402_proof::{
        codec::{AuthorizationHeader, PaymentRequiredHeader},
        protocol::{X402Protocol, now_millis},
        signer::sign_proof,
        types::{PaymentProof, PaymentRequest},
    };

    use crate::paywall::{PayWall, VerifiedPayment};

    fn paywall(recipient: Pubkey) -> PayWall {
        PayWall::builder().recipient(recipient).price(0.1).build()
    }

    async fn premium(Extension(payment): Extension<VerifiedPayment>) -> String {
        format!("paid by {}", payment.0.sender)
    }

    fn app(recipient: Pubkey) -> Router {
        Router::new()
            .route("/premium", get(premium))
            .layer(paywall(recipient))
    }

    fn get_request(header: Option<String>) -> axum::extract::Request {
        let mut builder = http::Request::builder().uri("/premium");
        if let Some(value) = header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn encoded_proof(protocol: &X402Protocol, keypair: &Keypair, recipient: &Pubkey) -> String {
        let proof = protocol
            .generate_proof(keypair, recipient, 0.1, None)
            .unwrap();
        AuthorizationHeader::try_from(proof).unwrap().0
    }

    #[tokio::test]
    async fn unauthenticated_request_receives_the_402_challenge() {
        let recipient = Pubkey::new_unique();

        let response = app(recipient).oneshot(get_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let www_authenticate = response.headers()[header::WWW_AUTHENTICATE]
            .to_str()
            .unwrap()
            .to_string();
        let terms =
            PaymentRequest::try_from(PaymentRequiredHeader(www_authenticate)).unwrap();
        assert_eq!(terms.recipient, recipient.to_string());
        assert_eq!(terms.amount, 0.1);
        let expiry = terms.expiry.unwrap();
        assert!(expiry > now_millis() + 240_000);
        assert!(expiry <= now_millis() + 300_000);

        assert_eq!(response.headers()["Accept-Payment"], "SOL, USDC");
        assert_eq!(response.headers()["Payment-Amount"], "0.1 SOL");

        let body = body_string(response).await;
        assert!(body.contains("x402"));
    }

    #[tokio::test]
    async fn paid_request_passes_through_exactly_once() {
        let keypair = Keypair::new();
        let recipient = Pubkey::new_unique();
        let protocol = X402Protocol::default();

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let app = Router::new()
            .route(
                "/premium",
                get(move || {
                    let counted = counted.clone();
                    async move {
                        counted.fetch_add(1, Ordering::SeqCst);
                        "ok"
                    }
                }),
            )
            .layer(paywall(recipient));

        let header = encoded_proof(&protocol, &keypair, &recipient);
        let response = app.oneshot(get_request(Some(header))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn verified_proof_is_readable_from_the_handler() {
        let keypair = Keypair::new();
        let recipient = Pubkey::new_unique();
        let protocol = X402Protocol::default();

        let header = encoded_proof(&protocol, &keypair, &recipient);
        let response = app(recipient).oneshot(get_request(Some(header))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.starts_with("paid by "));
    }

    #[tokio::test]
    async fn stale_proof_is_rejected_as_expired() {
        let keypair = Keypair::new();
        let recipient = Pubkey::new_unique();
        let protocol = X402Protocol::default();

        let mut proof: PaymentProof = protocol
            .generate_proof(&keypair, &recipient, 0.1, None)
            .unwrap();
        proof.timestamp = now_millis() - 301_000;
        proof.signature = sign_proof(&proof, &keypair).unwrap().to_string();
        let header = AuthorizationHeader::try_from(proof).unwrap().0;

        let response = app(recipient).oneshot(get_request(Some(header))).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_string(response).await;
        assert!(body.contains("freshness window"));
    }

    #[tokio::test]
    async fn hand_edited_amount_is_rejected_as_bad_signature() {
        let keypair = Keypair::new();
        let recipient = Pubkey::new_unique();
        let protocol = X402Protocol::default();

        let mut proof = protocol
            .generate_proof(&keypair, &recipient, 0.1, None)
            .unwrap();
        proof.amount = 1.0;
        let header = AuthorizationHeader::try_from(proof).unwrap().0;

        let response = app(recipient).oneshot(get_request(Some(header))).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_string(response).await;
        assert!(body.contains("signature"));
    }

    #[tokio::test]
    async fn garbage_header_is_a_400() {
        let recipient = Pubkey::new_unique();

        let response = app(recipient)
            .oneshot(get_request(Some("x402 %%not-base64%%".to_string())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        assert!(body.contains("Could not parse x402 payment proof"));
    }
}
