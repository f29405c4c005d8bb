//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use dobby_domain::error::DobbyError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`DobbyError`] and malformed request bodies to an HTTP response
/// with the appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(DobbyError),
    Body(JsonRejection),
}

impl From<DobbyError> for ApiError {
    fn from(err: DobbyError) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Body(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            Self::Domain(DobbyError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(DobbyError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
