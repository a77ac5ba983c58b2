//! Target directory and collision-free file naming

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};

use super::keys::join_path;
use super::{ImageDescriptor, StorageAdapter};

/// Naming helpers the host supplies to every adapter.
#[async_trait]
pub trait NamingPolicy: Send + Sync {
    /// Default directory for new files under `base_dir`.
    fn target_dir(&self, base_dir: &str) -> String;

    /// A path under `target_dir` that no stored object occupies yet.
    async fn unique_file_name(
        &self,
        adapter: &dyn StorageAdapter,
        image: &ImageDescriptor,
        target_dir: &str,
    ) -> String;
}

/// Year/month directories and counter-suffixed names (`photo-1.jpg`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DatedNaming;

#[async_trait]
impl NamingPolicy for DatedNaming {
    fn target_dir(&self, base_dir: &str) -> String {
        dated_dir(base_dir, Utc::now())
    }

    async fn unique_file_name(
        &self,
        adapter: &dyn StorageAdapter,
        image: &ImageDescriptor,
        target_dir: &str,
    ) -> String {
        let (stem, ext) = split_extension(&image.name);
        let stem = sanitize(stem);

        let mut attempt = 0u32;
        loop {
            let candidate = if attempt == 0 {
                format!("{}{}", stem, ext)
            } else {
                format!("{}-{}{}", stem, attempt, ext)
            };

            if !adapter.exists(&candidate, Some(target_dir)).await {
                return join_path(target_dir, &candidate);
            }
            attempt += 1;
        }
    }
}

/// `base_dir/YYYY/MM` for the given instant.
pub fn dated_dir(base_dir: &str, now: DateTime<Utc>) -> String {
    join_path(base_dir, &format!("{:04}/{:02}", now.year(), now.month()))
}

/// Replace every character outside `[A-Za-z0-9_@.]` with `-`.
///
/// A name that is empty or only dots becomes `-`, so it can never act as a
/// `.` or `..` path segment.
pub fn sanitize(name: &str) -> String {
    if name.chars().all(|c| c == '.') {
        return "-".to_string();
    }

    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Split a file name into stem and extension (dot included).
///
/// Only the final path component counts and a leading dot does not start an
/// extension, so `.hidden` has none.
fn split_extension(name: &str) -> (&str, &str) {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rfind('.') {
        Some(idx) if idx > 0 => base.split_at(idx),
        _ => (base, ""),
    }
}
