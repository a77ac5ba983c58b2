//! In-memory object store
//!
//! Used by tests and local development. Failures can be injected per
//! operation to exercise the adapter's error paths.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use futures::stream::StreamExt;

use crate::StoreError;

use super::{ObjectBody, ObjectMeta, ObjectStore, PutObject, StoredObject};

/// Store operation, used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Head,
    Put,
    Get,
    Delete,
}

/// Injected failure for an operation.
#[derive(Debug, Clone)]
pub enum Fault {
    /// The call itself fails.
    Fail(StoreError),
    /// `get` succeeds but its body errors after the first chunk.
    BrokenBody,
}

/// An object as stored in memory.
#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub data: Bytes,
    pub content_type: String,
    pub cache_control: String,
    pub acl: String,
    pub last_modified: String,
}

/// In-memory object store
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<String, MemoryObject>,
    faults: DashMap<Operation, Fault>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `op` fail with `fault`.
    pub fn inject(&self, op: Operation, fault: Fault) {
        self.faults.insert(op, fault);
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// Number of store calls issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn object(&self, key: &str) -> Option<MemoryObject> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Seed an object directly, bypassing call counting and faults.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>, content_type: &str) {
        self.objects.insert(
            key.into(),
            MemoryObject {
                data: data.into(),
                content_type: content_type.to_string(),
                cache_control: super::CACHE_CONTROL.to_string(),
                acl: crate::config::DEFAULT_ACL.to_string(),
                last_modified: http_date_now(),
            },
        );
    }

    fn begin(&self, op: Operation) -> Result<Option<Fault>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.faults.get(&op).map(|f| f.value().clone()) {
            Some(Fault::Fail(err)) => Err(err),
            other => Ok(other),
        }
    }

    fn meta(key: &str, object: &MemoryObject) -> ObjectMeta {
        ObjectMeta {
            cache_control: Some(object.cache_control.clone()),
            content_length: Some(object.data.len() as u64),
            content_type: Some(object.content_type.clone()),
            etag: Some(format!("\"{}-{}\"", key.len(), object.data.len())),
            last_modified: Some(object.last_modified.clone()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        self.begin(Operation::Head)?;
        self.objects
            .get(key)
            .map(|entry| Self::meta(key, entry.value()))
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(&self, request: PutObject) -> Result<(), StoreError> {
        self.begin(Operation::Put)?;
        self.objects.insert(
            request.key,
            MemoryObject {
                data: request.body,
                content_type: request.content_type,
                cache_control: request.cache_control,
                acl: request.acl,
                last_modified: http_date_now(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let fault = self.begin(Operation::Get)?;
        let object = self
            .objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let meta = Self::meta(key, &object);
        let body = match fault {
            Some(Fault::BrokenBody) => {
                let half = object.data.slice(..object.data.len() / 2);
                let chunks = vec![Ok(half), Err(StoreError::body("stream interrupted"))];
                ObjectBody::new(futures::stream::iter(chunks).boxed())
            }
            _ => ObjectBody::from_bytes(object.data),
        };

        Ok(StoredObject { meta, body })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.begin(Operation::Delete)?;
        self.objects.remove(key);
        Ok(())
    }
}

fn http_date_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
