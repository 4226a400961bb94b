//! In-process share record store for tests and local tooling

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    MarkViewed, ShareRecord, ShareRecordStorageError, ShareRecordStorageResult, ShareRecordStore,
};

/// Share record store backed by a mutex-guarded map
///
/// The compare-and-set in [`ShareRecordStore::conditional_mark_viewed`] runs under a
/// single lock acquisition, mirroring the conditional write of the `DynamoDB` store.
#[derive(Default)]
pub struct InMemoryShareRecordStorage {
    records: Mutex<HashMap<String, ShareRecord>>,
    fail_inserts: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryShareRecordStorage {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail with `StoreUnavailable`
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of store operations performed so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of records currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ShareRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ShareRecordStore for InMemoryShareRecordStorage {
    async fn insert(&self, record: &ShareRecord) -> ShareRecordStorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(ShareRecordStorageError::StoreUnavailable(
                "insert rejected".to_string(),
            ));
        }

        let mut records = self.lock();
        if records.contains_key(&record.token) {
            return Err(ShareRecordStorageError::TokenExists);
        }
        records.insert(record.token.clone(), record.clone());

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> ShareRecordStorageResult<Option<ShareRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(self.lock().get(token).cloned())
    }

    async fn conditional_mark_viewed(&self, token: &str) -> ShareRecordStorageResult<MarkViewed> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut records = self.lock();
        match records.get_mut(token) {
            Some(record) if !record.viewed => {
                record.viewed = true;
                record.viewed_at = Some(Utc::now().timestamp());
                Ok(MarkViewed::Applied(record.clone()))
            }
            _ => Ok(MarkViewed::Conflict),
        }
    }
}
