//! S3 object store

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime, DateTimeFormat};
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use futures::stream::StreamExt;
use tracing::instrument;

use crate::config::AdapterConfig;
use crate::StoreError;

use super::{ObjectBody, ObjectMeta, ObjectStore, PutObject, StoredObject};

/// S3 object store
///
/// Holds only connection settings. A fresh client is built for every
/// operation, so no connection state outlives a call.
#[derive(Clone)]
pub struct S3Store {
    bucket: String,
    region: String,
    endpoint: Option<String>,
    force_path_style: bool,
    access_key_id: String,
    secret_access_key: String,
}

impl S3Store {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
            force_path_style: config.force_path_style,
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
        }
    }

    async fn client(&self) -> Client {
        let credentials = Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            None,
            None,
            "ghost-s3-adapter",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut s3_config_builder =
            aws_sdk_s3::config::Builder::from(&config).force_path_style(self.force_path_style);

        if let Some(endpoint_url) = &self.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        Client::from_conf(s3_config_builder.build())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        let response = self
            .client()
            .await
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(key, &e))?;

        Ok(object_meta(
            response.cache_control(),
            response.content_length(),
            response.content_type(),
            response.e_tag(),
            response.last_modified(),
        ))
    }

    #[instrument(skip(self, request), fields(bucket = %self.bucket, key = %request.key))]
    async fn put(&self, request: PutObject) -> Result<(), StoreError> {
        self.client()
            .await
            .put_object()
            .bucket(&self.bucket)
            .key(&request.key)
            .body(ByteStream::from(request.body))
            .content_type(request.content_type)
            .cache_control(request.cache_control)
            .acl(ObjectCannedAcl::from(request.acl.as_str()))
            .send()
            .await
            .map_err(|e| store_error(&request.key, &e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let response = self
            .client()
            .await
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(key, &e))?;

        let meta = object_meta(
            response.cache_control(),
            response.content_length(),
            response.content_type(),
            response.e_tag(),
            response.last_modified(),
        );

        let body = futures::stream::try_unfold(response.body, |mut stream| async move {
            match stream.try_next().await {
                Ok(Some(chunk)) => Ok(Some((chunk, stream))),
                Ok(None) => Ok(None),
                Err(e) => Err(StoreError::body(format!("S3 body read failed: {}", e))),
            }
        });

        Ok(StoredObject {
            meta,
            body: ObjectBody::new(body.boxed()),
        })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client()
            .await
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(key, &e))?;

        Ok(())
    }
}

fn object_meta(
    cache_control: Option<&str>,
    content_length: Option<i64>,
    content_type: Option<&str>,
    etag: Option<&str>,
    last_modified: Option<&DateTime>,
) -> ObjectMeta {
    ObjectMeta {
        cache_control: cache_control.map(str::to_string),
        content_length: content_length.and_then(|len| u64::try_from(len).ok()),
        content_type: content_type.map(str::to_string),
        etag: etag.map(str::to_string),
        last_modified: last_modified.and_then(|t| t.fmt(DateTimeFormat::HttpDate).ok()),
    }
}

fn store_error<E>(key: &str, err: &SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    // HEAD responses carry no body, so their error code is often absent
    let status = err.raw_response().map(|r| r.status().as_u16());
    classify(key, err.code(), status, DisplayErrorContext(err).to_string())
}

/// Map an S3 error code or HTTP status onto the store vocabulary.
fn classify(key: &str, code: Option<&str>, status: Option<u16>, detail: String) -> StoreError {
    match (code, status) {
        (Some("NoSuchKey" | "NotFound"), _) | (None, Some(404)) => {
            StoreError::NotFound(key.to_string())
        }
        (Some("AccessDenied" | "AllAccessDisabled" | "Forbidden"), _) | (None, Some(403)) => {
            StoreError::AccessDenied(format!("{}: {}", key, detail))
        }
        _ => StoreError::request(format!("S3 request for {} failed: {}", key, detail)),
    }
}
