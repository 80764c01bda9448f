use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::fs::types::RemoteObject;

/// Errors raised by an object store.
///
/// Authorization failures are kept apart from everything else so the caller can
/// treat bad credentials as fatal while retrying or skipping past the rest.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Credentials missing, invalid or lacking permission
    #[error("access denied: {0}")]
    Unauthorized(String),

    /// Bucket or object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Network, throttling or any other backend failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Local I/O while writing a downloaded object
    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Unauthorized(_))
    }
}

/// S3-compatible storage providers
#[derive(Debug, Clone, PartialEq)]
pub enum S3Provider {
    Aws,
    Custom { endpoint: String },
}

impl S3Provider {
    /// Pick the provider from an optional endpoint override.
    pub fn from_endpoint(endpoint: Option<&str>) -> Self {
        match endpoint {
            Some(endpoint) if !endpoint.is_empty() => S3Provider::Custom {
                endpoint: endpoint.to_string(),
            },
            _ => S3Provider::Aws,
        }
    }

    /// Get the endpoint URL for this provider
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            S3Provider::Aws => None, // Use default AWS endpoint
            S3Provider::Custom { endpoint } => Some(endpoint),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            S3Provider::Aws => "AWS S3",
            S3Provider::Custom { endpoint } => endpoint,
        }
    }
}

/// Producer of listing pages. Finite and not restartable: once it returns
/// `Ok(None)` the listing is exhausted.
#[async_trait]
pub trait ObjectPager: Send {
    /// Fetch the next page. An empty page is valid and does not end the listing.
    async fn next_page(&mut self) -> Result<Option<Vec<RemoteObject>>, StoreError>;
}

/// Minimal capability interface over a bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Start a paginated listing of every key under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Box<dyn ObjectPager>, StoreError>;

    /// Fetch `key` into `local_path`, overwriting it. Returns the bytes written.
    async fn download(&self, key: &str, local_path: &Path) -> Result<u64, StoreError>;

    /// Human-readable location for log lines.
    fn describe(&self) -> String;
}
