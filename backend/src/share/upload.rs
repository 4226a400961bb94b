//! Upload orchestration: validate, store the image, then issue its link

use std::sync::Arc;

use axum::body::Bytes;
use thiserror::Error;
use tracing::{info, instrument};

use super::issuer::{IssueError, ShareLink, TokenIssuer};
use crate::media_storage::{object_key, BucketError, ObjectStore};

/// Largest accepted image (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Reasons an upload is rejected before reaching any store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The file is larger than the limit
    #[error("File of {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Size of the rejected file in bytes
        size: usize,
        /// Maximum accepted size in bytes
        limit: usize,
    },

    /// The file has no content
    #[error("File is empty")]
    Empty,

    /// The content type is not `image/*`
    #[error("Unsupported content type: {0}")]
    NotAnImage(String),
}

/// Errors that can occur while uploading an image
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file was rejected locally
    #[error("Invalid upload: {0}")]
    Validation(#[from] ValidationError),

    /// The object store rejected or failed the write
    #[error("Failed to store image: {0}")]
    Object(#[from] BucketError),

    /// The image was stored but no share record could be persisted
    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl UploadError {
    /// Message shown to the uploader
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::TooLarge { .. })
            | Self::Object(BucketError::TooLarge { .. }) => "File size must be less than 10MB",
            Self::Validation(ValidationError::Empty) => "Please choose a file to upload",
            Self::Validation(ValidationError::NotAnImage(_)) => "Only image files can be shared",
            Self::Object(_) | Self::Issue(_) => "Error uploading image. Please try again.",
        }
    }
}

/// A file selected for sharing
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name, used in the object key
    pub file_name: String,
    /// Declared content type
    pub content_type: String,
    /// File contents
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Checks the upload against the size limit and content type
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` that applies
    pub fn validate(&self, size_limit: usize) -> Result<(), ValidationError> {
        if self.bytes.is_empty() {
            return Err(ValidationError::Empty);
        }

        if self.bytes.len() > size_limit {
            return Err(ValidationError::TooLarge {
                size: self.bytes.len(),
                limit: size_limit,
            });
        }

        let is_image = self
            .content_type
            .parse::<mime::Mime>()
            .is_ok_and(|m| m.type_() == mime::IMAGE);
        if !is_image {
            return Err(ValidationError::NotAnImage(self.content_type.clone()));
        }

        Ok(())
    }
}

/// Stores uploaded images and issues their one-time links
pub struct UploadService {
    objects: Arc<dyn ObjectStore>,
    issuer: TokenIssuer,
    size_limit: usize,
}

impl UploadService {
    /// Creates a new upload service with the default 10 MiB limit
    #[must_use]
    pub fn new(objects: Arc<dyn ObjectStore>, issuer: TokenIssuer) -> Self {
        Self {
            objects,
            issuer,
            size_limit: MAX_UPLOAD_BYTES,
        }
    }

    /// Largest accepted upload in bytes
    #[must_use]
    pub const fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Validates and stores `upload`, then issues a share link for it
    ///
    /// # Errors
    ///
    /// - `UploadError::Validation` - rejected before any store call
    /// - `UploadError::Object` - the image could not be stored
    /// - `UploadError::Issue` - the share record could not be persisted; no link exists
    #[instrument(skip_all, fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload(&self, upload: ImageUpload) -> Result<ShareLink, UploadError> {
        upload.validate(self.size_limit)?;

        let key = object_key(&upload.file_name);
        let object_address = self
            .objects
            .put(&key, upload.bytes, &upload.content_type, self.size_limit)
            .await?;

        let link = self.issuer.issue(&object_address).await?;

        info!(key = %key, "Image uploaded and shared");

        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use backend_storage::share_record::{memory::InMemoryShareRecordStorage, ShareRecordStore};

    use super::*;
    use crate::media_storage::mock::InMemoryObjectStore;

    struct Fixture {
        objects: Arc<InMemoryObjectStore>,
        records: Arc<InMemoryShareRecordStorage>,
        service: UploadService,
    }

    fn fixture() -> Fixture {
        let objects = Arc::new(InMemoryObjectStore::new());
        let records = Arc::new(InMemoryShareRecordStorage::new());
        let issuer = TokenIssuer::new(records.clone(), "https://peek.example");
        let service = UploadService::new(objects.clone(), issuer);
        Fixture {
            objects,
            records,
            service,
        }
    }

    fn image(size: usize) -> ImageUpload {
        ImageUpload {
            file_name: "cat.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: Bytes::from(vec![7u8; size]),
        }
    }

    #[tokio::test]
    async fn test_upload_stores_object_and_issues_link() {
        let f = fixture();

        let link = f.service.upload(image(1024)).await.unwrap();

        let record = f
            .records
            .find_by_token(link.token.as_str())
            .await
            .unwrap()
            .unwrap();
        let (bytes, content_type) = f.objects.get_by_address(&record.object_address).unwrap();
        assert_eq!(bytes.len(), 1024);
        assert_eq!(content_type, "image/png");
        assert!(record.object_address.ends_with("-cat.png"));
    }

    #[tokio::test]
    async fn test_exactly_max_size_is_accepted() {
        let f = fixture();

        assert_eq!(f.service.size_limit(), MAX_UPLOAD_BYTES);
        assert!(f.service.upload(image(MAX_UPLOAD_BYTES)).await.is_ok());
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected_before_store_calls() {
        let f = fixture();

        let err = f.service.upload(image(MAX_UPLOAD_BYTES + 1)).await.unwrap_err();

        assert!(matches!(
            err,
            UploadError::Validation(ValidationError::TooLarge {
                size,
                limit: MAX_UPLOAD_BYTES
            }) if size == MAX_UPLOAD_BYTES + 1
        ));
        assert_eq!(err.user_message(), "File size must be less than 10MB");
        assert_eq!(f.objects.put_calls(), 0);
        assert_eq!(f.records.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_image_rejected() {
        let f = fixture();
        let mut upload = image(10);
        upload.content_type = "application/pdf".to_string();

        let err = f.service.upload(upload).await.unwrap_err();

        assert!(matches!(
            err,
            UploadError::Validation(ValidationError::NotAnImage(_))
        ));
        assert_eq!(f.objects.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let f = fixture();

        let err = f.service.upload(image(0)).await.unwrap_err();

        assert!(matches!(err, UploadError::Validation(ValidationError::Empty)));
    }

    #[tokio::test]
    async fn test_object_failure_issues_nothing() {
        let f = fixture();
        f.objects.fail_puts(true);

        let err = f.service.upload(image(10)).await.unwrap_err();

        assert!(matches!(err, UploadError::Object(_)));
        assert_eq!(f.records.calls(), 0);
    }

    #[tokio::test]
    async fn test_record_failure_produces_no_link() {
        let f = fixture();
        f.records.fail_inserts(true);

        let err = f.service.upload(image(10)).await.unwrap_err();

        assert!(matches!(err, UploadError::Issue(_)));
        assert_eq!(err.user_message(), "Error uploading image. Please try again.");
        assert!(f.records.is_empty());
    }
}
