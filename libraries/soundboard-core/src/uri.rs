//! Sound location helpers
//!
//! Board entries and catalog entries store locations as strings: `file://` URIs,
//! plain filesystem paths, or remote/content URIs that only the platform can
//! resolve. These helpers translate between the string form and local paths.

use std::path::{Component, Path, PathBuf};
use url::Url;

/// Resolve a stored location to a local filesystem path
///
/// Returns `None` for locations that are not on the local filesystem
/// (`http(s)://`, `content://`, ...).
pub fn to_local_path(uri: &str) -> Option<PathBuf> {
    if uri.is_empty() {
        return None;
    }

    if uri.starts_with("file:") {
        return Url::parse(uri).ok()?.to_file_path().ok();
    }

    // Windows drive letters parse as a one-letter scheme
    if Url::parse(uri).is_ok_and(|url| url.scheme().len() > 1) {
        return None;
    }

    Some(PathBuf::from(uri))
}

/// Render a local path as a `file://` URI, falling back to the plain path
pub fn from_local_path(path: &Path) -> String {
    Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|()| path.display().to_string())
}

/// Resolve `.` and `..` components without touching the filesystem
///
/// `..` never climbs above the root; on a relative path leading `..`
/// components are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// Last path segment of a location, without query string
pub fn file_name(uri: &str) -> Option<&str> {
    let without_query = uri.split(['?', '#']).next().unwrap_or(uri);
    without_query
        .rsplit(['/', '\\'])
        .next()
        .filter(|segment| !segment.is_empty())
}
