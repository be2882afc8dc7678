use axum::{Extension, Json, Router, routing::get};
use serde_json::{Value, json};
use solana_pubkey::Pubkey;
use x402_paywall::paywall::{PayWall, VerifiedPayment};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let recipient = std::env::var("RECIPIENT_PUBKEY")
        .expect("Please set `RECIPIENT_PUBKEY` in environment variables")
        .parse::<Pubkey>()
        .expect("RECIPIENT_PUBKEY must be a base58 public key");

    let paywall = PayWall::builder().recipient(recipient).price(0.1).build();

    let app = Router::new()
        .route("/premium", get(premium_feed))
        .layer(paywall);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid u16 integer");
    let addr: std::net::SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Serving paywalled resource on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server failed");
}

async fn premium_feed(Extension(payment): Extension<VerifiedPayment>) -> Json<Value> {
    Json(json!({
        "message": "You have accessed a protected resource!",
        "paid_by": payment.0.sender,
        "amount": payment.0.amount,
    }))
}
