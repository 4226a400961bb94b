//! S3-based object storage for uploaded images
mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use axum::body::Bytes;
use uuid::Uuid;

pub use error::{BucketError, BucketResult};

/// Cache lifetime advertised on stored images
const CACHE_CONTROL: &str = "max-age=3600";

/// Longest file name fragment kept in an object key
const MAX_KEY_FILE_NAME_LEN: usize = 100;

/// Object storage used for uploaded images
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the public address of the object
    ///
    /// Objects larger than `size_limit` are rejected before any network call.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::TooLarge` for oversized objects and a storage error
    /// if the write fails or `key` is already taken.
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        size_limit: usize,
    ) -> BucketResult<String>;

    /// Public address of the object stored under `key`
    fn public_address(&self, key: &str) -> String;
}

/// Builds a fresh object key for an uploaded file
///
/// Keys look like `images/<uuid>-<file name>` where the file name is reduced to
/// `[A-Za-z0-9._-]` so the resulting address needs no escaping.
#[must_use]
pub fn object_key(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_KEY_FILE_NAME_LEN)
        .collect();

    let id = Uuid::new_v4().simple();
    if sanitized.is_empty() {
        format!("images/{id}")
    } else {
        format!("images/{id}-{sanitized}")
    }
}

/// Image storage client for S3 operations
pub struct MediaStorage {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    public_base_url: String,
}

impl MediaStorage {
    /// Creates a new media storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket name for image storage
    /// * `public_base_url` - Base URL under which bucket objects are publicly readable
    #[must_use]
    pub fn new(s3_client: Arc<S3Client>, bucket_name: String, public_base_url: &str) -> Self {
        Self {
            s3_client,
            bucket_name,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for MediaStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        size_limit: usize,
    ) -> BucketResult<String> {
        if bytes.len() > size_limit {
            return Err(BucketError::TooLarge {
                size: bytes.len(),
                limit: size_limit,
            });
        }

        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .cache_control(CACHE_CONTROL)
            // Never overwrite an existing object
            .if_none_match("*")
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok(self.public_address(key))
    }

    fn public_address(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};

    use async_trait::async_trait;
    use axum::body::Bytes;

    use super::{BucketError, BucketResult, ObjectStore};

    /// Address scheme served by [`InMemoryObjectStore`]
    pub const MEMORY_SCHEME: &str = "memory://";

    /// Object store keeping objects in memory
    #[derive(Default)]
    pub struct InMemoryObjectStore {
        objects: Mutex<HashMap<String, (Bytes, String)>>,
        put_calls: AtomicUsize,
        fail_puts: AtomicBool,
    }

    impl InMemoryObjectStore {
        /// Creates an empty store
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent put fail with an upstream error
        pub fn fail_puts(&self, fail: bool) {
            self.fail_puts.store(fail, Ordering::SeqCst);
        }

        /// Number of puts that reached the store, including rejected ones
        #[must_use]
        pub fn put_calls(&self) -> usize {
            self.put_calls.load(Ordering::SeqCst)
        }

        /// Number of objects stored
        #[must_use]
        pub fn len(&self) -> usize {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Whether no object has been stored
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Looks up an object by its public address
        #[must_use]
        pub fn get_by_address(&self, address: &str) -> Option<(Bytes, String)> {
            let key = address.strip_prefix(MEMORY_SCHEME)?;
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned()
        }

        /// Removes the object behind `address`, simulating a lost object
        pub fn remove_by_address(&self, address: &str) {
            if let Some(key) = address.strip_prefix(MEMORY_SCHEME) {
                self.objects
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(key);
            }
        }
    }

    #[async_trait]
    impl ObjectStore for InMemoryObjectStore {
        async fn put(
            &self,
            key: &str,
            bytes: Bytes,
            content_type: &str,
            size_limit: usize,
        ) -> BucketResult<String> {
            if bytes.len() > size_limit {
                return Err(BucketError::TooLarge {
                    size: bytes.len(),
                    limit: size_limit,
                });
            }

            self.put_calls.fetch_add(1, Ordering::SeqCst);

            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(BucketError::UpstreamError("put rejected".to_string()));
            }

            let mut objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
            if objects.contains_key(key) {
                return Err(BucketError::ObjectExists(key.to_string()));
            }
            objects.insert(key.to_string(), (bytes, content_type.to_string()));

            Ok(self.public_address(key))
        }

        fn public_address(&self, key: &str) -> String {
            format!("{MEMORY_SCHEME}{key}")
        }
    }
}
