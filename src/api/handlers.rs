//! API handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::storage::{ObjectMeta, ObjectStore};
use crate::StoreError;

pub const NOT_FOUND_BODY: &str = "File not found";

/// Serve the object named by the request path.
///
/// Any failure becomes a 404 with a fixed body; the cause is only logged.
pub async fn serve_object(State(store): State<Arc<dyn ObjectStore>>, uri: Uri) -> Response {
    let path = uri.path();
    let key = path.strip_prefix('/').unwrap_or(path);

    match fetch_object(store.as_ref(), key).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(key, error = %err, "Object could not be served");
            (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
        }
    }
}

async fn fetch_object(store: &dyn ObjectStore, key: &str) -> Result<Response, StoreError> {
    let object = store.get(key).await?;
    let data = object.body.collect().await?;

    let mut response = Response::new(Body::from(data));
    *response.status_mut() = StatusCode::OK;
    forward_headers(response.headers_mut(), &object.meta);

    Ok(response)
}

fn forward_headers(headers: &mut HeaderMap, meta: &ObjectMeta) {
    let text_headers = [
        (header::CACHE_CONTROL, meta.cache_control.as_deref()),
        (header::CONTENT_TYPE, meta.content_type.as_deref()),
        (header::ETAG, meta.etag.as_deref()),
        (header::LAST_MODIFIED, meta.last_modified.as_deref()),
    ];

    for (name, value) in text_headers {
        if let Some(value) = value {
            insert_header(headers, name, value);
        }
    }

    if let Some(len) = meta.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::debug!(header = %name, "Dropping unrepresentable header value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_headers_skips_absent_values() {
        let meta = ObjectMeta {
            cache_control: Some("max-age=2592000".to_string()),
            content_length: Some(3),
            content_type: None,
            etag: Some("\"abc\"".to_string()),
            last_modified: Some("bad\nvalue".to_string()),
        };

        let mut headers = HeaderMap::new();
        forward_headers(&mut headers, &meta);

        assert_eq!(headers[header::CACHE_CONTROL], "max-age=2592000");
        assert_eq!(headers[header::CONTENT_LENGTH], "3");
        assert_eq!(headers[header::ETAG], "\"abc\"");
        assert!(headers.get(header::CONTENT_TYPE).is_none());
        assert!(headers.get(header::LAST_MODIFIED).is_none());
    }
}
