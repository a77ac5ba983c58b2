//! ghost-s3-adapter - image storage for content-management hosts, backed by S3
//!
//! The adapter implements the host's storage contract:
//! - `exists` / `delete` as best-effort checks that never fail
//! - `save` uploads a local temporary file and returns its public URL
//! - `read` fetches an asset previously produced by `save`
//! - `serve` builds a request handler streaming objects back to clients
//!
//! Any S3-compatible service works through a custom endpoint and
//! path-style addressing.

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod storage;

pub use adapter::{
    DatedNaming, ImageDescriptor, NamingPolicy, ReadOptions, S3Adapter, StorageAdapter,
};
pub use config::AdapterConfig;
pub use error::{Error, Result, StoreError};
