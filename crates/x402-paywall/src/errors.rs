use bytes::Bytes;
use http::{HeaderName, HeaderValue, Response, StatusCode};
use http_body_util::Full;
use serde::{Deserialize, Serialize};

/// JSON body attached to every paywall rejection.
///
/// Always machine-parseable, so an automated client can read the terms, pay
/// and retry without human intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequiredBody {
    /// Short failure class, e.g. `Payment Required`.
    pub error: String,
    /// Human-readable reason for this specific rejection.
    pub message: String,
    /// Price of the resource, e.g. `0.1 SOL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Base58 identity payments must go to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

/// A paywall rejection: status code, challenge headers and JSON body.
#[derive(Debug, Clone)]
pub struct PayWallErrorResponse {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: PaymentRequiredBody,
}

impl From<PayWallErrorResponse> for Response<Full<Bytes>> {
    fn from(value: PayWallErrorResponse) -> Self {
        let body = match serde_json::to_vec(&value.body) {
            Ok(b) => b,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to serialize PayWallErrorResponse body to JSON: {_err}");

                let mut response = Response::new(Full::new(Bytes::from_static(
                    b"Failed to serialize PayWallErrorResponse body to JSON",
                )));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;

                return response;
            }
        };

        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = value.status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        for (name, val) in value.headers {
            response.headers_mut().insert(name, val);
        }
        response
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for PayWallErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status, axum::extract::Json(self.body)).into_response();
        for (name, val) in self.headers {
            response.headers_mut().insert(name, val);
        }
        response
    }
}
