use filetime::FileTime;
use std::path::Path;
use std::sync::Arc;

use crate::error::SyncError;
use crate::fs::{ObjectStore, RemoteObject};

/// Materializes DOWNLOAD decisions against the local tree.
pub struct DownloadExecutor {
    store: Arc<dyn ObjectStore>,
}

impl DownloadExecutor {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Fetch `remote` to `local_path` and stamp it with the remote mtime.
    ///
    /// On success the file satisfies the size + mtime check of the next run.
    pub async fn execute(&self, remote: &RemoteObject, local_path: &Path) -> Result<u64, SyncError> {
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::io(parent, e))?;
        }

        let bytes = self
            .store
            .download(&remote.key, local_path)
            .await
            .map_err(|source| SyncError::Download {
                key: remote.key.clone(),
                source,
            })?;

        stamp_mtime(local_path, remote)?;
        Ok(bytes)
    }
}

/// Set both atime and mtime to the object's last-modified time.
pub fn stamp_mtime(path: &Path, remote: &RemoteObject) -> Result<(), SyncError> {
    let ts = FileTime::from_unix_time(
        remote.last_modified.timestamp(),
        remote.last_modified.timestamp_subsec_nanos(),
    );
    filetime::set_file_times(path, ts, ts).map_err(|e| SyncError::io(path, e))
}
