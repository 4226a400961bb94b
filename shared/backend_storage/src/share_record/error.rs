//! Error types for share record storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    get_item::GetItemError, put_item::PutItemError, update_item::UpdateItemError,
};
use thiserror::Error;

/// Result type alias for share record storage operations
pub type ShareRecordStorageResult<T> = Result<T, ShareRecordStorageError>;

/// Errors that can occur during share record storage operations
#[derive(Debug, Error)]
pub enum ShareRecordStorageError {
    /// Failed to insert share record into `DynamoDB`
    #[error("Failed to insert share record into DynamoDB: {0:?}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to get share record from `DynamoDB`
    #[error("Failed to get share record from DynamoDB: {0:?}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to update share record in `DynamoDB`
    #[error("Failed to update share record in DynamoDB: {0:?}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// A record with the same token already exists
    #[error("Share record already exists")]
    TokenExists,

    /// Failed to convert a share record to or from a `DynamoDB` item
    #[error("Failed to parse share record: {0}")]
    SerializationError(String),

    /// The record store could not be reached
    #[error("Share record store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<serde_dynamo::Error> for ShareRecordStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
