//! Share record storage module for `DynamoDB` operations
//!
//! A share record binds a one-time token to the address of a stored image and
//! tracks whether that token has been consumed.

mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::SdkError,
    types::{AttributeValue, ReturnValue},
    Client as DynamoDbClient,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_dynamo::{from_item, to_item};
use strum::Display;

pub use error::{ShareRecordStorageError, ShareRecordStorageResult};

/// `DynamoDB` item for a one-time share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    /// Primary key - opaque URL-safe token
    pub token: String,
    /// Public address of the stored image
    pub object_address: String,
    /// Whether the token has been redeemed
    pub viewed: bool,
    /// Timestamp of record creation
    pub created_at: i64,
    /// Timestamp of the redemption, set together with `viewed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<i64>,
}

impl ShareRecord {
    /// Creates an unviewed record for a freshly issued token
    #[must_use]
    pub fn new(token: String, object_address: String) -> Self {
        Self {
            token,
            object_address,
            viewed: false,
            created_at: Utc::now().timestamp(),
            viewed_at: None,
        }
    }
}

/// `DynamoDB` attribute names for the share record table
#[derive(Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ShareRecordAttribute {
    /// Primary key - share token
    Token,
    /// Address of the stored object
    ObjectAddress,
    /// Consumed flag
    Viewed,
    /// Creation timestamp
    CreatedAt,
    /// Redemption timestamp
    ViewedAt,
}

/// Outcome of a conditional `viewed = false -> true` update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkViewed {
    /// This call flipped the flag; carries the record as written
    Applied(ShareRecord),
    /// The condition did not hold: the record is missing or already viewed
    Conflict,
}

/// Durable store of share records
#[async_trait]
pub trait ShareRecordStore: Send + Sync {
    /// Inserts a new record, failing if the token is already taken
    async fn insert(&self, record: &ShareRecord) -> ShareRecordStorageResult<()>;

    /// Fetches a record by token
    async fn find_by_token(&self, token: &str) -> ShareRecordStorageResult<Option<ShareRecord>>;

    /// Atomically sets `viewed = true` if and only if it is currently `false`
    ///
    /// The result of this call, not any earlier read, decides who gets the image.
    async fn conditional_mark_viewed(&self, token: &str) -> ShareRecordStorageResult<MarkViewed>;
}

/// Storage client for share records in `DynamoDB`
pub struct ShareRecordStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl ShareRecordStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for share records
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }
}

#[async_trait]
impl ShareRecordStore for ShareRecordStorage {
    async fn insert(&self, record: &ShareRecord) -> ShareRecordStorageResult<()> {
        let item = to_item(record)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", ShareRecordAttribute::Token.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    ShareRecordStorageError::TokenExists
                } else {
                    err.into()
                }
            })?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> ShareRecordStorageResult<Option<ShareRecord>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(
                ShareRecordAttribute::Token.to_string(),
                AttributeValue::S(token.to_string()),
            )
            .consistent_read(true)
            .send()
            .await?;

        response
            .item()
            .map(|item| from_item(item.clone()).map_err(ShareRecordStorageError::from))
            .transpose()
    }

    async fn conditional_mark_viewed(&self, token: &str) -> ShareRecordStorageResult<MarkViewed> {
        let result = self
            .dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(
                ShareRecordAttribute::Token.to_string(),
                AttributeValue::S(token.to_string()),
            )
            .condition_expression("attribute_exists(#token) AND #viewed = :unviewed")
            .update_expression("SET #viewed = :viewed, #viewed_at = :viewed_at")
            .expression_attribute_names("#token", ShareRecordAttribute::Token.to_string())
            .expression_attribute_names("#viewed", ShareRecordAttribute::Viewed.to_string())
            .expression_attribute_names("#viewed_at", ShareRecordAttribute::ViewedAt.to_string())
            .expression_attribute_values(":unviewed", AttributeValue::Bool(false))
            .expression_attribute_values(":viewed", AttributeValue::Bool(true))
            .expression_attribute_values(
                ":viewed_at",
                AttributeValue::N(Utc::now().timestamp().to_string()),
            )
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => {
                let item = output.attributes().cloned().ok_or_else(|| {
                    ShareRecordStorageError::SerializationError(
                        "update returned no attributes".to_string(),
                    )
                })?;
                Ok(MarkViewed::Applied(from_item(item)?))
            }
            Err(SdkError::ServiceError(ref svc))
                if svc.err().is_conditional_check_failed_exception() =>
            {
                Ok(MarkViewed::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }
}
