//! Token issuing: binds a fresh token to a stored object

use std::sync::Arc;

use backend_storage::share_record::{ShareRecord, ShareRecordStorageError, ShareRecordStore};
use thiserror::Error;
use tracing::info;

use super::token::ShareToken;

/// Errors that can occur while issuing a share link
#[derive(Debug, Error)]
pub enum IssueError {
    /// The share record could not be persisted; no link exists
    #[error("Failed to persist share record: {0}")]
    Store(#[from] ShareRecordStorageError),
}

/// A shareable one-time link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    /// Token embedded in the link
    pub token: ShareToken,
    /// Fully qualified `<origin>/view/<token>` URL
    pub url: String,
}

/// Issues one-time tokens for stored objects
pub struct TokenIssuer {
    records: Arc<dyn ShareRecordStore>,
    link_origin: String,
}

impl TokenIssuer {
    /// Creates a new issuer
    ///
    /// # Arguments
    ///
    /// * `records` - Durable store for share records
    /// * `link_origin` - Origin of the viewer, e.g. `https://peekonce.example`
    #[must_use]
    pub fn new(records: Arc<dyn ShareRecordStore>, link_origin: &str) -> Self {
        Self {
            records,
            link_origin: link_origin.trim_end_matches('/').to_string(),
        }
    }

    /// Issues a link for an object that is already durably stored
    ///
    /// # Errors
    ///
    /// Returns `IssueError::Store` if the share record cannot be persisted. No link
    /// is produced in that case.
    pub async fn issue(&self, object_address: &str) -> Result<ShareLink, IssueError> {
        let token = ShareToken::generate();
        let record = ShareRecord::new(token.to_string(), object_address.to_string());

        self.records.insert(&record).await?;

        info!(object_address, "Issued share token");

        Ok(ShareLink {
            url: self.link_url(&token),
            token,
        })
    }

    fn link_url(&self, token: &ShareToken) -> String {
        format!("{}/view/{token}", self.link_origin)
    }
}

#[cfg(test)]
mod tests {
    use backend_storage::share_record::memory::InMemoryShareRecordStorage;

    use super::*;

    #[tokio::test]
    async fn test_issue_persists_unviewed_record() {
        let records = Arc::new(InMemoryShareRecordStorage::new());
        let issuer = TokenIssuer::new(records.clone(), "https://peek.example/");

        let link = issuer.issue("https://cdn.example/images/a.png").await.unwrap();

        assert_eq!(
            link.url,
            format!("https://peek.example/view/{}", link.token)
        );
        let record = records
            .find_by_token(link.token.as_str())
            .await
            .unwrap()
            .expect("record should be persisted");
        assert_eq!(record.object_address, "https://cdn.example/images/a.png");
        assert!(!record.viewed);
    }

    #[tokio::test]
    async fn test_issue_fails_without_link_when_store_fails() {
        let records = Arc::new(InMemoryShareRecordStorage::new());
        records.fail_inserts(true);
        let issuer = TokenIssuer::new(records.clone(), "https://peek.example");

        let result = issuer.issue("https://cdn.example/images/a.png").await;

        assert!(matches!(result, Err(IssueError::Store(_))));
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_each_issue_gets_a_new_token() {
        let records = Arc::new(InMemoryShareRecordStorage::new());
        let issuer = TokenIssuer::new(records.clone(), "https://peek.example");

        let a = issuer.issue("https://cdn.example/a").await.unwrap();
        let b = issuer.issue("https://cdn.example/a").await.unwrap();

        assert_ne!(a.token, b.token);
        assert_eq!(records.len(), 2);
    }
}
