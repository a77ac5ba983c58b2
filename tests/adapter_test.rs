//! End-to-end tests of the adapter contract against the in-memory store

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use ghost_s3_adapter::adapter::keys::join_path;
use ghost_s3_adapter::storage::memory::{Fault, MemoryStore, Operation};
use ghost_s3_adapter::{
    AdapterConfig, DatedNaming, Error, ImageDescriptor, NamingPolicy, ReadOptions, S3Adapter,
    StorageAdapter, StoreError,
};
use tempfile::NamedTempFile;

/// Year/month naming frozen at May 2024.
struct May2024;

#[async_trait]
impl NamingPolicy for May2024 {
    fn target_dir(&self, base_dir: &str) -> String {
        join_path(base_dir, "2024/05")
    }

    async fn unique_file_name(
        &self,
        adapter: &dyn StorageAdapter,
        image: &ImageDescriptor,
        target_dir: &str,
    ) -> String {
        DatedNaming
            .unique_file_name(adapter, image, target_dir)
            .await
    }
}

fn base_config() -> AdapterConfig {
    AdapterConfig::new("a", "b", "us-east-1", "imgs")
}

fn adapter_with(config: AdapterConfig, store: Arc<MemoryStore>) -> S3Adapter {
    S3Adapter::with_store(config, store)
        .unwrap()
        .with_naming(Arc::new(May2024))
}

fn temp_image(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_save_returns_root_relative_url() {
    let store = Arc::new(MemoryStore::new());
    let adapter = adapter_with(base_config(), store.clone());

    let file = temp_image(b"jpeg bytes");
    let image = ImageDescriptor::new(file.path(), "photo.jpg", "image/jpeg");

    let url = adapter.save(&image, None).await.unwrap();
    assert_eq!(url, "/content/images/2024/05/photo.jpg");

    let object = store.object("2024/05/photo.jpg").unwrap();
    assert_eq!(object.data, Bytes::from_static(b"jpeg bytes"));
    assert_eq!(object.content_type, "image/jpeg");
    assert_eq!(object.cache_control, "max-age=2592000");
    assert_eq!(object.acl, "public-read");
}

#[tokio::test]
async fn test_save_returns_absolute_url() {
    let store = Arc::new(MemoryStore::new());
    let config = base_config().with_asset_url("https://cdn.example.com/");
    let adapter = adapter_with(config, store.clone());

    let file = temp_image(b"jpeg bytes");
    let image = ImageDescriptor::new(file.path(), "photo.jpg", "image/jpeg");

    let url = adapter.save(&image, None).await.unwrap();
    assert_eq!(url, "https://cdn.example.com/2024/05/photo.jpg");
    assert_eq!(store.keys(), vec!["2024/05/photo.jpg".to_string()]);
}

#[tokio::test]
async fn test_save_avoids_collisions_and_applies_prefix() {
    let store = Arc::new(MemoryStore::new());
    store.insert("blog/2024/05/my-photo.jpg", "old", "image/jpeg");
    store.insert("blog/2024/05/my-photo-1.jpg", "old", "image/jpeg");

    let mut config = base_config().with_path_prefix("/blog/");
    config.acl = "private".to_string();
    let adapter = adapter_with(config, store.clone());

    let file = temp_image(b"new");
    let image = ImageDescriptor::new(file.path(), "my photo.jpg", "image/jpeg");

    let url = adapter.save(&image, None).await.unwrap();
    assert_eq!(url, "/content/images/blog/2024/05/my-photo-2.jpg");
    assert_eq!(store.object("blog/2024/05/my-photo-2.jpg").unwrap().acl, "private");
    assert_eq!(
        store.object("blog/2024/05/my-photo.jpg").unwrap().data,
        Bytes::from_static(b"old")
    );
}

#[tokio::test]
async fn test_save_into_explicit_target_dir() {
    let store = Arc::new(MemoryStore::new());
    let adapter = adapter_with(base_config(), store.clone());

    let file = temp_image(b"png");
    let image = ImageDescriptor::new(file.path(), "logo@2x.png", "image/png");

    let url = adapter.save(&image, Some("/size/w600")).await.unwrap();
    assert_eq!(url, "/content/images/size/w600/logo@2x.png");
    assert!(store.object("size/w600/logo@2x.png").is_some());
}

#[tokio::test]
async fn test_save_dot_names_stay_in_target_dir() {
    let store = Arc::new(MemoryStore::new());
    let adapter = adapter_with(base_config().with_path_prefix("blog"), store.clone());

    for name in ["..", "."] {
        let file = temp_image(b"dots");
        let image = ImageDescriptor::new(file.path(), name, "image/jpeg");

        let url = adapter.save(&image, None).await.unwrap();
        assert!(
            url.starts_with("/content/images/blog/2024/05/"),
            "{:?} saved as {}",
            name,
            url
        );
    }

    assert_eq!(
        store.keys(),
        vec!["blog/2024/05/-".to_string(), "blog/2024/05/-.".to_string()]
    );
}

#[tokio::test]
async fn test_save_propagates_upload_error() {
    let store = Arc::new(MemoryStore::new());
    store.inject(
        Operation::Put,
        Fault::Fail(StoreError::AccessDenied("imgs".to_string())),
    );
    let adapter = adapter_with(base_config(), store.clone());

    let file = temp_image(b"jpeg bytes");
    let image = ImageDescriptor::new(file.path(), "photo.jpg", "image/jpeg");

    match adapter.save(&image, None).await {
        Err(Error::Upload { key, source }) => {
            assert_eq!(key, "2024/05/photo.jpg");
            assert!(matches!(source, StoreError::AccessDenied(_)));
        }
        other => panic!("expected upload error, got {:?}", other),
    }
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn test_save_missing_temp_file() {
    let store = Arc::new(MemoryStore::new());
    let adapter = adapter_with(base_config(), store.clone());

    let dir = tempfile::tempdir().unwrap();
    let image = ImageDescriptor::new(dir.path().join("gone.jpg"), "gone.jpg", "image/jpeg");

    assert!(matches!(
        adapter.save(&image, None).await,
        Err(Error::Io(_))
    ));
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn test_saved_url_reads_back() {
    let store = Arc::new(MemoryStore::new());
    let adapter = adapter_with(base_config(), store.clone());

    let file = temp_image(b"round trip");
    let image = ImageDescriptor::new(file.path(), "photo.jpg", "image/jpeg");
    let url = adapter.save(&image, None).await.unwrap();

    let data = adapter.read(ReadOptions::path(url)).await.unwrap();
    assert_eq!(data, Bytes::from_static(b"round trip"));
}

#[tokio::test]
async fn test_saved_url_reads_back_with_repeated_trailing_slashes() {
    let store = Arc::new(MemoryStore::new());
    let config = base_config().with_asset_url("/content/images//");
    let adapter = adapter_with(config, store.clone());

    let file = temp_image(b"slashes");
    let image = ImageDescriptor::new(file.path(), "photo.jpg", "image/jpeg");
    let url = adapter.save(&image, None).await.unwrap();
    assert_eq!(url, "/content/images//2024/05/photo.jpg");

    let data = adapter.read(ReadOptions::path(url)).await.unwrap();
    assert_eq!(data, Bytes::from_static(b"slashes"));
}

#[tokio::test]
async fn test_read_resolves_key_from_asset_path() {
    let store = Arc::new(MemoryStore::new());
    store.insert("2024/05/photo.jpg", "stored", "image/jpeg");
    let adapter = adapter_with(base_config(), store);

    let data = adapter
        .read(ReadOptions::path("/content/images/2024/05/photo.jpg"))
        .await
        .unwrap();
    assert_eq!(data, Bytes::from_static(b"stored"));
}

#[tokio::test]
async fn test_read_outside_asset_url_is_invalid() {
    let store = Arc::new(MemoryStore::new());
    let adapter = adapter_with(base_config(), store.clone());

    let err = adapter
        .read(ReadOptions::path("/other/path.jpg"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
    assert!(err.to_string().contains("/other/path.jpg"));
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_exists_and_delete_with_target_dir() {
    let store = Arc::new(MemoryStore::new());
    store.insert("2024/05/photo.jpg", "stored", "image/jpeg");
    let adapter = adapter_with(base_config(), store.clone());

    assert!(adapter.exists("photo.jpg", Some("/2024/05")).await);
    assert!(adapter.delete("photo.jpg", Some("/2024/05")).await);
    assert!(!adapter.exists("photo.jpg", Some("/2024/05")).await);

    store.inject(
        Operation::Delete,
        Fault::Fail(StoreError::request("network unreachable")),
    );
    assert!(!adapter.delete("photo.jpg", Some("/2024/05")).await);
}

#[test]
fn test_construction_reports_missing_field() {
    let mut config = base_config();
    config.bucket.clear();

    match S3Adapter::with_store(config, Arc::new(MemoryStore::new())) {
        Err(err @ Error::Configuration { .. }) => assert!(err.to_string().contains("bucket")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("construction should fail"),
    }
}
