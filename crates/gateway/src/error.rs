//! Maps `support_agent_core::Error` onto the `{"error":{"code",...}}`
//! envelope (). The only place in the workspace that knows
//! HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use support_agent_core::Error;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "unhandled error surfaced as 500");
            "an internal error occurred".to_string()
        } else {
            self.0.to_string()
        };
        let body = Json(serde_json::json!({
            "error": { "code": self.0.code(), "message": message }
        }));
        (status, body).into_response()
    }
}
