//! HTTP serving of stored objects

use axum::Router;
use std::sync::Arc;
use url::Url;

use crate::storage::ObjectStore;

pub mod handlers;

/// Build the router that serves objects from `store`.
///
/// Every request, whatever its method or path, is answered by
/// [`handlers::serve_object`]. Mount it under the asset path so the
/// request path seen here is the object key.
pub fn create_router(store: Arc<dyn ObjectStore>) -> Router {
    Router::new()
        .fallback(handlers::serve_object)
        .with_state(store)
}

/// Path under which the serve router is mounted for a given asset URL.
///
/// Absolute asset URLs contribute their path component. Returns `/` when
/// the router should sit at the root.
pub fn mount_path(asset_url: &str) -> String {
    let path = if asset_url.starts_with('/') {
        asset_url.to_string()
    } else {
        Url::parse(asset_url)
            .map(|u| u.path().to_string())
            .unwrap_or_default()
    };

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
