//! The host's storage contract and its S3 implementation

use std::path::PathBuf;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;

use crate::Result;

pub mod keys;
pub mod naming;
pub mod s3;

pub use naming::{DatedNaming, NamingPolicy};
pub use s3::S3Adapter;

/// Storage operations a host invokes on its adapter.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Whether `file_name` exists under `target_dir`. Never fails.
    async fn exists(&self, file_name: &str, target_dir: Option<&str>) -> bool;

    /// Persist an uploaded image and return its public URL.
    async fn save(&self, image: &ImageDescriptor, target_dir: Option<&str>) -> Result<String>;

    /// Request handler serving stored objects by path.
    fn serve(&self) -> Router;

    /// Best-effort removal; `false` when the backend refused.
    async fn delete(&self, file_name: &str, target_dir: Option<&str>) -> bool;

    /// Fetch the bytes behind a URL previously returned by `save`.
    async fn read(&self, options: ReadOptions) -> Result<Bytes>;
}

/// An uploaded image waiting in a local temporary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Temporary file holding the upload
    pub path: PathBuf,
    /// Original file name
    pub name: String,
    /// Declared MIME type
    pub content_type: String,
}

impl ImageDescriptor {
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub path: Option<String>,
}

impl ReadOptions {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}
