//! S3-backed storage adapter

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::api;
use crate::config::AdapterConfig;
use crate::storage::s3::S3Store;
use crate::storage::{ObjectStore, PutObject, CACHE_CONTROL};
use crate::{Error, Result};

use super::keys::{asset_url_for_key, key_from_asset_path, resolve_key, strip_leading_slash};
use super::{DatedNaming, ImageDescriptor, NamingPolicy, ReadOptions, StorageAdapter};

/// Storage adapter persisting images to an S3 bucket
pub struct S3Adapter {
    config: Arc<AdapterConfig>,
    store: Arc<dyn ObjectStore>,
    naming: Arc<dyn NamingPolicy>,
}

impl S3Adapter {
    /// Validate `config` and target the S3 bucket it names.
    ///
    /// No request is made here; clients are built per operation.
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let config = config.validated()?;
        let store = Arc::new(S3Store::new(&config));
        Ok(Self::assemble(config, store))
    }

    /// Validate `config` and use `store` instead of S3.
    pub fn with_store(config: AdapterConfig, store: Arc<dyn ObjectStore>) -> Result<Self> {
        let config = config.validated()?;
        Ok(Self::assemble(config, store))
    }

    fn assemble(config: AdapterConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            naming: Arc::new(DatedNaming),
        }
    }

    /// Replace the default year/month naming helpers.
    pub fn with_naming(mut self, naming: Arc<dyn NamingPolicy>) -> Self {
        self.naming = naming;
        self
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn key_for(&self, file_name: &str, target_dir: Option<&str>) -> String {
        match target_dir {
            Some(dir) => resolve_key(dir, file_name),
            None => resolve_key(&self.naming.target_dir(&self.config.path_prefix), file_name),
        }
    }
}

#[async_trait]
impl StorageAdapter for S3Adapter {
    async fn exists(&self, file_name: &str, target_dir: Option<&str>) -> bool {
        let key = self.key_for(file_name, target_dir);
        match self.store.head(&key).await {
            Ok(_) => true,
            Err(err) => {
                debug!(%key, error = %err, "Existence check reported missing");
                false
            }
        }
    }

    async fn save(&self, image: &ImageDescriptor, target_dir: Option<&str>) -> Result<String> {
        let base_key = self.key_for("", target_dir);
        let file_name = self
            .naming
            .unique_file_name(self, image, &base_key)
            .await;
        let key = strip_leading_slash(&file_name).to_string();

        let body = tokio::fs::read(&image.path).await?;
        let size = body.len();

        self.store
            .put(PutObject {
                key: key.clone(),
                body: Bytes::from(body),
                content_type: image.content_type.clone(),
                cache_control: CACHE_CONTROL.to_string(),
                acl: self.config.acl.clone(),
            })
            .await
            .map_err(|e| Error::upload(&key, e))?;

        info!(%key, size, content_type = %image.content_type, "Stored image");

        asset_url_for_key(&self.config.asset_url, &key)
    }

    fn serve(&self) -> Router {
        api::create_router(self.store.clone())
    }

    async fn delete(&self, file_name: &str, target_dir: Option<&str>) -> bool {
        let key = self.key_for(file_name, target_dir);
        match self.store.delete(&key).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%key, error = %err, "Failed to delete object");
                false
            }
        }
    }

    async fn read(&self, options: ReadOptions) -> Result<Bytes> {
        let path = options.path.unwrap_or_default();
        let key = key_from_asset_path(&self.config.asset_url, &path)
            .ok_or_else(|| Error::InvalidPath(path.clone()))?;

        let object = self
            .store
            .get(&key)
            .await
            .map_err(|e| Error::retrieval(&key, e))?;

        object
            .body
            .collect()
            .await
            .map_err(|e| Error::retrieval(&key, e))
    }
}
