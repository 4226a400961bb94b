//! Error types for object storage operations

use aws_sdk_s3::{error::SdkError, operation::put_object::PutObjectError};
use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur during object storage operations
#[derive(Error, Debug)]
pub enum BucketError {
    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Object already exists in bucket
    #[error("Object already exists: {0}")]
    ObjectExists(String),

    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// Object exceeds the size limit; raised before any network call
    #[error("Object of {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Size of the rejected object in bytes
        size: usize,
        /// Maximum accepted size in bytes
        limit: usize,
    },
}

impl From<SdkError<PutObjectError>> for BucketError {
    fn from(error: SdkError<PutObjectError>) -> Self {
        match error {
            SdkError::ServiceError(err) => {
                let status = err.raw().status().as_u16();
                if status == 412 {
                    Self::ObjectExists(format!("{:?}", err.err()))
                } else if status >= 500 {
                    Self::UpstreamError(format!("{:?}", err.err()))
                } else {
                    Self::S3Error(format!("{:?}", err.err()))
                }
            }
            _ => Self::AwsError(error.to_string()),
        }
    }
}
