//! Object storage abstraction layer
//!
//! Provides the bucket-scoped interface the adapter talks to, with an S3
//! implementation and an in-memory one.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};

use crate::StoreError;

pub mod memory;
pub mod s3;

/// Cache-control applied to every uploaded object (30 days).
pub const CACHE_CONTROL: &str = "max-age=2592000";

/// Object store trait, scoped to a single bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch object metadata without the body
    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError>;

    /// Write an object, replacing any previous value
    async fn put(&self, request: PutObject) -> Result<(), StoreError>;

    /// Fetch an object's headers and body stream
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// Delete an object
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Upload request for [`ObjectStore::put`].
#[derive(Debug, Clone)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub cache_control: String,
    pub acl: String,
}

/// Response headers the store reports for an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    pub cache_control: Option<String>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    /// HTTP-date formatted
    pub last_modified: Option<String>,
}

/// Object returned by [`ObjectStore::get`].
pub struct StoredObject {
    pub meta: ObjectMeta,
    pub body: ObjectBody,
}

/// Chunked object body, drained lazily.
pub struct ObjectBody {
    inner: BoxStream<'static, Result<Bytes, StoreError>>,
}

impl ObjectBody {
    pub fn new(stream: BoxStream<'static, Result<Bytes, StoreError>>) -> Self {
        Self { inner: stream }
    }

    pub fn from_bytes(data: Bytes) -> Self {
        Self::new(futures::stream::once(async move { Ok(data) }).boxed())
    }

    /// Drain every chunk into one contiguous buffer.
    pub async fn collect(mut self) -> Result<Bytes, StoreError> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.inner.try_next().await? {
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody").finish_non_exhaustive()
    }
}
