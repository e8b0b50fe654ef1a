use crate::models::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// Converts core errors into HTTP responses
#[derive(Debug)]
pub struct ApiError(pub shared::Error);

impl From<shared::Error> for ApiError {
    fn from(err: shared::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            err @ shared::Error::InvalidKey => (StatusCode::BAD_REQUEST, err.to_string()),
            // Store details stay in the logs
            err => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
