use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
    Extension, Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    share::{ImageUpload, UploadService},
    types::AppError,
};

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    /// One-time token embedded in the link
    pub token: String,
    /// Link to hand to the viewer; it works exactly once
    pub share_url: String,
}

fn multipart_error(err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "file_too_large",
            "File size must be less than 10MB",
            false,
        )
    } else {
        tracing::warn!("Malformed multipart body: {err}");
        AppError::new(
            StatusCode::BAD_REQUEST,
            "invalid_multipart",
            "Malformed upload body",
            false,
        )
    }
}

/// Uploads an image and returns its one-time share link
///
/// Expects a `multipart/form-data` body with a single `file` field.
///
/// # Returns
///
/// Returns `201 CREATED` with the token and share URL
///
/// # Errors
///
/// - `400 BAD_REQUEST` - missing, empty or non-image file
/// - `413 PAYLOAD_TOO_LARGE` - file larger than 10 MiB; nothing is stored
/// - `503 SERVICE_UNAVAILABLE` - object or record store failure; no link is produced
#[instrument(skip_all)]
pub async fn upload_image(
    Extension(upload_service): Extension<Arc<UploadService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;

        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    let upload = upload.ok_or(AppError::new(
        StatusCode::BAD_REQUEST,
        "invalid_file",
        "Please choose a file to upload",
        false,
    ))?;

    let link = upload_service.upload(upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            token: link.token.to_string(),
            share_url: link.url,
        }),
    ))
}
