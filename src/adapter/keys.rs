//! Key resolution and asset URL mapping
//!
//! Keys are bucket-relative: they never start with `/`. Asset URLs are the
//! public form of a key, either a root-relative path or an absolute URL.

use url::Url;

use crate::{Error, Result};

/// Join two path fragments with POSIX semantics and normalize the result.
///
/// Empty fragments are ignored, repeated separators collapse, `.` segments
/// drop and `..` pops the previous segment. A leading `/` is kept, a
/// trailing one is not.
pub fn join_path(base: &str, name: &str) -> String {
    let joined = match (base.is_empty(), name.is_empty()) {
        (true, true) => return String::new(),
        (true, false) => name.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, name),
    };
    normalize(&joined)
}

fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !absolute {
                    // relative paths keep a `..` that climbs past their start
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let body = segments.join("/");
    if absolute {
        format!("/{}", body)
    } else {
        body
    }
}

/// Strip exactly one leading `/`.
pub fn strip_leading_slash(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Resolve a target directory and file name to an object key.
pub fn resolve_key(target_dir: &str, file_name: &str) -> String {
    let joined = join_path(target_dir, file_name);
    strip_leading_slash(&joined).to_string()
}

/// Build the public reference for `key` under `asset_url`.
///
/// Root-relative asset URLs yield `asset_url` + key; anything else is
/// parsed as an absolute base URL and the key resolved against it. The
/// base is treated as a directory in both cases.
pub fn asset_url_for_key(asset_url: &str, key: &str) -> Result<String> {
    let key = strip_leading_slash(key);

    if asset_url.starts_with('/') {
        // built from the literal prefix so `key_from_asset_path` can strip it
        return Ok(if asset_url.ends_with('/') {
            format!("{}{}", asset_url, key)
        } else {
            format!("{}/{}", asset_url, key)
        });
    }

    let mut base =
        Url::parse(asset_url).map_err(|e| Error::configuration("assetUrl", e.to_string()))?;
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }

    // `./` keeps a key like `a:b` from parsing as a scheme
    let url = base
        .join(&format!("./{}", key))
        .map_err(|e| Error::configuration("assetUrl", e.to_string()))?;
    Ok(url.to_string())
}

/// Recover the object key from a public path under `asset_url`.
///
/// Returns `None` when the path is not owned by this store.
pub fn key_from_asset_path(asset_url: &str, path: &str) -> Option<String> {
    let rest = path.strip_prefix(asset_url)?;
    let rest = rest.trim_end_matches('/');
    Some(strip_leading_slash(rest).to_string())
}
