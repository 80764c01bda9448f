use chrono::{DateTime, Utc};

/// One object reported by a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Full key under the bucket, unique within a listing.
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Opaque content fingerprint. Plain MD5 hex for single-part uploads,
    /// `<md5>-<parts>` for multipart uploads.
    pub etag: String,
}

impl RemoteObject {
    pub fn new(
        key: impl Into<String>,
        size: u64,
        last_modified: DateTime<Utc>,
        etag: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            size,
            last_modified,
            etag: etag.into(),
        }
    }

    /// Keys ending in `/` are folder placeholders, not content.
    pub fn is_dir_marker(&self) -> bool {
        self.key.ends_with('/')
    }

    /// Multipart etags carry a `-<parts>` suffix and are not a content MD5.
    pub fn is_multipart(&self) -> bool {
        self.etag.contains('-')
    }

    /// Remote mtime truncated to whole seconds.
    pub fn mtime_secs(&self) -> i64 {
        self.last_modified.timestamp()
    }
}
