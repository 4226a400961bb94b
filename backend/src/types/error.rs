//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::media_storage::BucketError;
use crate::share::{IssueError, RedeemError, UploadError, ValidationError};

/// API error response envelope
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    pub error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    allow_retry: bool,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            code,
            message: msg,
            allow_retry: retry,
        }
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.code, self.message),
            500..=599 => tracing::error!("Server error: {} - {}", self.code, self.message),
            _ => {}
        }

        let body = ApiErrorResponse {
            allow_retry: self.allow_retry,
            error: ErrorBody {
                code: self.code.to_string(),
                message: self.message.to_string(),
            },
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert redemption errors to application errors
impl From<RedeemError> for AppError {
    fn from(err: RedeemError) -> Self {
        match &err {
            RedeemError::Unavailable(reason) => Self::new(
                StatusCode::GONE,
                reason.code(),
                reason.user_message(),
                false,
            ),
            RedeemError::Store(e) => {
                tracing::error!("Share record store error during redemption: {e}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_error",
                    err.user_message(),
                    true,
                )
            }
            RedeemError::Transport(msg) => {
                tracing::error!("Redemption transport error: {msg}");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    err.user_message(),
                    true,
                )
            }
        }
    }
}

/// Convert upload errors to application errors
impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let message = err.user_message();

        match &err {
            UploadError::Validation(ValidationError::TooLarge { .. })
            | UploadError::Object(BucketError::TooLarge { .. }) => Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "file_too_large",
                message,
                false,
            ),
            UploadError::Validation(ValidationError::Empty) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_file", message, false)
            }
            UploadError::Validation(ValidationError::NotAnImage(content_type)) => {
                tracing::debug!("Rejected content type: {content_type}");
                Self::new(StatusCode::BAD_REQUEST, "not_an_image", message, false)
            }
            UploadError::Object(BucketError::ObjectExists(key)) => {
                tracing::error!("Object key collision: {key}");
                Self::new(StatusCode::CONFLICT, "already_exists", message, true)
            }
            UploadError::Object(BucketError::UpstreamError(msg)) => {
                tracing::error!("S3 upstream error: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    message,
                    true,
                )
            }
            UploadError::Object(BucketError::S3Error(msg) | BucketError::AwsError(msg)) => {
                tracing::error!("S3/AWS error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    message,
                    true,
                )
            }
            UploadError::Issue(IssueError::Store(e)) => {
                tracing::error!("Share record store error during upload: {e}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_error",
                    message,
                    true,
                )
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
