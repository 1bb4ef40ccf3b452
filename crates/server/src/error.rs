use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use newsfeed_core::error::CoreError;
use serde::Serialize;
use snafu::Snafu;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// HTTP-facing error, thin over [`CoreError`]: domain validation and
/// conflict failures answer 400, anything unhandled answers 500.
#[derive(Debug, Snafu)]
pub enum ApiError {
    #[snafu(display("{source}"))]
    Domain { source: CoreError },

    #[snafu(display("invalid request body"))]
    BadRequest { message: String },
}

impl From<CoreError> for ApiError {
    fn from(source: CoreError) -> Self {
        ApiError::Domain { source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Domain { source } => {
                let status = if source.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, source.to_string())
            }
            ApiError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}
