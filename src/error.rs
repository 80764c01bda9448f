//! Error taxonomy for a sync run.
//!
//! Only configuration and credential errors are fatal to the process. A listing
//! error aborts the prefix being walked; everything else is scoped to a single
//! object and recorded in the run report.

use std::path::PathBuf;
use thiserror::Error;

use crate::fs::StoreError;

/// Errors while loading the sync configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config key `{0}` must not be empty")]
    Empty(&'static str),
}

/// Errors raised while syncing a prefix.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Credentials rejected the first time the store was called
    #[error("credentials rejected by {store}: {source}")]
    Credential {
        store: String,
        #[source]
        source: StoreError,
    },

    /// Listing the prefix failed; no further pages are requested
    #[error("failed to list `{prefix}`: {source}")]
    Listing {
        prefix: String,
        #[source]
        source: StoreError,
    },

    /// Transfer of a single object failed
    #[error("failed to download {key}: {source}")]
    Download {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Key would map outside the local root or onto the root itself
    #[error("refusing to map key `{0}` to a local path")]
    UnsafeKey(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Whether the error must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Config(_) | SyncError::Credential { .. })
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}
