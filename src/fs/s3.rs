use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use opendal::{services::S3, Entry, ErrorKind, Operator};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::fs::backend::{ObjectPager, ObjectStore, S3Provider, StoreError};
use crate::fs::types::RemoteObject;

/// Entries per page, matching the S3 ListObjectsV2 maximum.
pub const PAGE_SIZE: usize = 1000;

/// S3 and S3-compatible storage backend using OpenDAL
pub struct S3Store {
    operator: Operator,
    bucket: String,
    region: String,
    provider: S3Provider,
}

impl S3Store {
    /// Create a new S3-compatible backend with explicit credentials
    pub fn new(
        bucket: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        provider: S3Provider,
    ) -> Result<Self, StoreError> {
        let mut builder = S3::default()
            .bucket(bucket)
            .region(region)
            .access_key_id(access_key)
            .secret_access_key(secret_key);

        // Set custom endpoint for S3-compatible providers
        if let Some(endpoint) = provider.endpoint() {
            builder = builder.endpoint(endpoint);
        }

        let operator = Operator::new(builder).map_err(map_opendal_error)?.finish();

        Ok(Self {
            operator,
            bucket: bucket.to_string(),
            region: region.to_string(),
            provider,
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str) -> Result<Box<dyn ObjectPager>, StoreError> {
        let path = if prefix.is_empty() { "/" } else { prefix };

        let lister = self
            .operator
            .lister_with(path)
            .recursive(true)
            .await
            .map_err(map_opendal_error)?;

        let entries = lister
            .map(|entry| entry.map(to_remote_object).map_err(map_opendal_error))
            .boxed();
        Ok(Box::new(StreamPager::new(entries, PAGE_SIZE)))
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<u64, StoreError> {
        let reader = self
            .operator
            .reader(key)
            .await
            .map_err(map_opendal_error)?;
        let mut stream = Box::pin(
            reader
                .into_bytes_stream(..)
                .await
                .map_err(map_opendal_error)?,
        );

        let mut file = tokio::fs::File::create(local_path).await?;
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StoreError::Backend(format!("{key}: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    fn describe(&self) -> String {
        format!(
            "s3://{} ({}, {})",
            self.bucket,
            self.provider.display_name(),
            self.region
        )
    }
}

/// Groups a lazy object stream into pages of at most `page_size` entries.
pub struct StreamPager {
    entries: BoxStream<'static, Result<RemoteObject, StoreError>>,
    page_size: usize,
    exhausted: bool,
}

impl StreamPager {
    pub fn new(entries: BoxStream<'static, Result<RemoteObject, StoreError>>, page_size: usize) -> Self {
        Self {
            entries,
            page_size: page_size.max(1),
            exhausted: false,
        }
    }
}

#[async_trait]
impl ObjectPager for StreamPager {
    async fn next_page(&mut self) -> Result<Option<Vec<RemoteObject>>, StoreError> {
        if self.exhausted {
            return Ok(None);
        }

        let mut page = Vec::with_capacity(self.page_size);
        while page.len() < self.page_size {
            match self.entries.next().await {
                Some(obj) => page.push(obj?),
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }

        if page.is_empty() && self.exhausted {
            return Ok(None);
        }
        Ok(Some(page))
    }
}

fn to_remote_object(entry: Entry) -> RemoteObject {
    let meta = entry.metadata();
    let last_modified = meta
        .last_modified()
        .and_then(|ts| parse_timestamp(&ts.to_string()))
        .unwrap_or(DateTime::UNIX_EPOCH);

    RemoteObject {
        key: object_key(entry.path(), meta.mode().is_dir()),
        size: meta.content_length(),
        last_modified,
        etag: meta.etag().unwrap_or_default().to_string(),
    }
}

/// Directory entries keep a trailing slash so the catalog treats them as
/// markers.
fn object_key(path: &str, is_dir: bool) -> String {
    let mut key = path.to_string();
    if is_dir && !key.ends_with('/') {
        key.push('/');
    }
    key
}

/// Parse a listing timestamp rendered either as RFC 3339 or as
/// `YYYY-MM-DD HH:MM:SS[.f] UTC`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = raw.trim().trim_end_matches("UTC").trim_end();
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|ts| ts.and_utc())
}

fn map_opendal_error(err: opendal::Error) -> StoreError {
    match err.kind() {
        ErrorKind::PermissionDenied => StoreError::Unauthorized(err.to_string()),
        ErrorKind::NotFound => StoreError::NotFound(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}
