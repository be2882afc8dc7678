//! # x402 Paywall
//!
//! A framework-agnostic HTTP paywall for the x402 proof protocol.
//!
//! [`PayWall`](paywall::PayWall) wraps a protected operation so that it only
//! runs given a valid, unexpired proof of sufficient amount. It decides
//! admission per request:
//!
//! - No proof attached: respond `402 Payment Required` with the full
//!   challenge header set, so an automated client can pay and retry without
//!   human intervention.
//! - Proof attached but undecodable: respond `400 Bad Request` naming the
//!   decode failure.
//! - Proof attached but failing verification (or paying the wrong recipient
//!   or too little): respond `402` naming the specific reason.
//! - Proof valid: attach it to the request as
//!   [`VerifiedPayment`](paywall::VerifiedPayment) and invoke the protected
//!   operation exactly once, passing its response through unchanged.
//!
//! The paywall never moves funds and holds no per-request state; one instance
//! is configured per protected resource and price point.
//!
//! ## Framework Integration
//!
//! With the `axum` feature (on by default), [`PayWall`](paywall::PayWall)
//! implements `tower::Layer` and can be dropped onto any router:
//!
//! ```rust,ignore
//! let paywall = PayWall::builder()
//!     .recipient(creator_pubkey)
//!     .price(0.1)
//!     .build();
//!
//! let app = Router::new()
//!     .route("/premium", get(premium_feed))
//!     .layer(paywall);
//! ```
//!
//! Handlers read the verified proof via `Extension<VerifiedPayment>`.

pub mod errors;
pub mod paywall;

#[cfg(feature = "axum")]
pub mod axum;
