//! Change detection: decide whether a listed object needs to be fetched.
//!
//! The comparison runs in three tiers and stops at the first match:
//!
//! 1. no local file: download;
//! 2. same size and same whole-second mtime: skip;
//! 3. single-part etag equal to the local MD5: skip;
//!
//! and downloads otherwise. Multipart etags are not a content MD5, so those
//! objects are always fetched again once tier 2 misses.

use filetime::FileTime;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::fs::RemoteObject;
use crate::sync::hash::{md5_file, md5_matches_etag};

/// Why an object was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SizeAndMtime,
    Checksum,
}

/// Why an object has to be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadReason {
    Missing,
    ContentChanged,
    MultipartEtag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Skip(SkipReason),
    Download(DownloadReason),
}

impl SyncDecision {
    pub fn is_skip(&self) -> bool {
        matches!(self, SyncDecision::Skip(_))
    }
}

impl fmt::Display for SyncDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyncDecision::Skip(SkipReason::SizeAndMtime) => "same size & mtime",
            SyncDecision::Skip(SkipReason::Checksum) => "same checksum",
            SyncDecision::Download(DownloadReason::Missing) => "not present locally",
            SyncDecision::Download(DownloadReason::ContentChanged) => "content changed",
            SyncDecision::Download(DownloadReason::MultipartEtag) => "multipart etag, cannot verify",
        };
        f.write_str(text)
    }
}

/// Metadata of the on-disk counterpart of a remote object.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    pub size: u64,
    /// Whole seconds since the epoch.
    pub mtime: i64,
    pub md5: Option<String>,
}

impl LocalFile {
    /// Stat `path`. Returns `Ok(None)` when nothing exists there.
    pub fn stat(path: &Path) -> io::Result<Option<Self>> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(Self {
                path: path.to_path_buf(),
                size: meta.len(),
                mtime: FileTime::from_last_modification_time(&meta).unix_seconds(),
                md5: None,
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Compute and cache the MD5 of the file contents.
    pub fn md5(&mut self) -> io::Result<&str> {
        if self.md5.is_none() {
            self.md5 = Some(md5_file(&self.path)?);
        }
        Ok(self.md5.as_deref().unwrap_or_default())
    }
}

/// Decide whether `remote` has to be fetched to `local_path`.
///
/// Never fails: anything that prevents confirming a match results in a
/// download.
pub fn decide(remote: &RemoteObject, local_path: &Path) -> SyncDecision {
    let mut local = match LocalFile::stat(local_path) {
        Ok(Some(local)) => local,
        Ok(None) => return SyncDecision::Download(DownloadReason::Missing),
        Err(e) => {
            warn!("Cannot stat {}: {}", local_path.display(), e);
            return SyncDecision::Download(DownloadReason::Missing);
        }
    };

    if local.size == remote.size && local.mtime == remote.mtime_secs() {
        return SyncDecision::Skip(SkipReason::SizeAndMtime);
    }

    if remote.is_multipart() {
        return SyncDecision::Download(DownloadReason::MultipartEtag);
    }

    match local.md5() {
        Ok(md5) if md5_matches_etag(md5, &remote.etag) => SyncDecision::Skip(SkipReason::Checksum),
        Ok(_) => SyncDecision::Download(DownloadReason::ContentChanged),
        Err(e) => {
            warn!("Cannot hash {}: {}", local_path.display(), e);
            SyncDecision::Download(DownloadReason::ContentChanged)
        }
    }
}
