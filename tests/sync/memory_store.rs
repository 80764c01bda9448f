// In-memory ObjectStore with scripted pages and injectable failures

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use s3pull::fs::{ObjectPager, ObjectStore, RemoteObject, StoreError};
use s3pull::sync::md5_bytes;

pub const MTIME: i64 = 1_704_067_200;

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Single-part object whose etag is the quoted MD5 of `body`.
pub fn object(key: &str, body: &[u8]) -> RemoteObject {
    RemoteObject::new(key, body.len() as u64, at(MTIME), format!("\"{}\"", md5_bytes(body)))
}

/// Multipart object: the etag is not a content MD5.
pub fn multipart_object(key: &str, body: &[u8]) -> RemoteObject {
    RemoteObject::new(
        key,
        body.len() as u64,
        at(MTIME),
        format!("\"{}-2\"", md5_bytes(body)),
    )
}

pub fn marker(key: &str) -> RemoteObject {
    RemoteObject::new(key, 0, at(MTIME), "\"d41d8cd98f00b204e9800998ecf8427e\"")
}

#[derive(Default)]
pub struct MemoryStore {
    pages: Vec<Vec<RemoteObject>>,
    contents: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    deny_listing: bool,
    fail_listing_after: Option<usize>,
    downloads: Mutex<Vec<String>>,
    list_calls: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new listing page. Stores begin with no pages at all.
    pub fn new_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Append a downloadable object to the current page.
    pub fn with_object(mut self, obj: RemoteObject, body: &[u8]) -> Self {
        self.contents.insert(obj.key.clone(), body.to_vec());
        self.push(obj);
        self
    }

    /// Append an object that only exists in the listing.
    pub fn with_listed(mut self, obj: RemoteObject) -> Self {
        self.push(obj);
        self
    }

    fn push(&mut self, obj: RemoteObject) {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        if let Some(page) = self.pages.last_mut() {
            page.push(obj);
        }
    }

    pub fn fail_download(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn deny_listing(mut self) -> Self {
        self.deny_listing = true;
        self
    }

    pub fn fail_listing_after(mut self, pages: usize) -> Self {
        self.fail_listing_after = Some(pages);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

struct MemoryPager {
    pages: VecDeque<Vec<RemoteObject>>,
    served: usize,
    deny: bool,
    fail_after: Option<usize>,
}

#[async_trait]
impl ObjectPager for MemoryPager {
    async fn next_page(&mut self) -> Result<Option<Vec<RemoteObject>>, StoreError> {
        if self.deny {
            return Err(StoreError::Unauthorized("InvalidAccessKeyId".into()));
        }
        if self.fail_after == Some(self.served) {
            return Err(StoreError::Backend("connection reset by peer".into()));
        }
        self.served += 1;
        Ok(self.pages.pop_front())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, _prefix: &str) -> Result<Box<dyn ObjectPager>, StoreError> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(Box::new(MemoryPager {
            pages: self.pages.clone().into(),
            served: 0,
            deny: self.deny_listing,
            fail_after: self.fail_listing_after,
        }))
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<u64, StoreError> {
        if self.failing.contains(key) {
            return Err(StoreError::Backend(format!("{key}: connection reset by peer")));
        }
        let body = self
            .contents
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        tokio::fs::write(local_path, body).await?;
        self.downloads.lock().unwrap().push(key.to_string());
        Ok(body.len() as u64)
    }

    fn describe(&self) -> String {
        "memory://test".to_string()
    }
}
