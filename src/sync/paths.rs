use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// Directory part of `prefix`: everything up to and including its last `/`.
fn prefix_dir(prefix: &str) -> &str {
    match prefix.rfind('/') {
        Some(idx) => &prefix[..=idx],
        None => "",
    }
}

/// Part of `key` below `prefix`, treating the prefix as a directory.
///
/// `photos` and `photos/` both strip `photos/` from `photos/a.jpg`. Keys that
/// only share a partial name with the prefix (`photos/2024-01.jpg` under
/// `photos/2024-0`) fall back to stripping the prefix's directory part.
fn relative_key<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let dir = prefix.trim_end_matches('/');
    if dir.is_empty() {
        return Some(key);
    }
    if key == dir {
        return Some("");
    }
    if let Some(rest) = key.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        return Some(rest);
    }
    key.strip_prefix(prefix_dir(prefix))
}

/// Map a remote key to its path under `root`.
pub fn local_path_for(root: &Path, prefix: &str, key: &str) -> Result<PathBuf, SyncError> {
    let relative =
        relative_key(prefix, key).ok_or_else(|| SyncError::UnsafeKey(key.to_string()))?;

    let mut path = root.to_path_buf();
    let mut depth = 0usize;

    for segment in relative.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(SyncError::UnsafeKey(key.to_string())),
            segment => {
                path.push(segment);
                depth += 1;
            }
        }
    }

    if depth == 0 {
        return Err(SyncError::UnsafeKey(key.to_string()));
    }
    Ok(path)
}
