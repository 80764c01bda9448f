//! Catalog traversal over a paginated remote listing.

use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::fs::{ObjectPager, ObjectStore, RemoteObject, StoreError};

/// Listing counters, updated as the catalog is drained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Pages received, including empty ones.
    pub pages: usize,
    /// Content objects handed downstream.
    pub objects: usize,
    /// Directory marker keys filtered out.
    pub markers_skipped: usize,
}

/// Lazy walk over every content object under a prefix.
///
/// Only one page is held in memory at a time; the next page is requested when
/// the current one is drained. Once the pager is exhausted or a listing call
/// fails, no further requests are made.
pub struct Catalog {
    pager: Box<dyn ObjectPager>,
    page: VecDeque<RemoteObject>,
    stats: CatalogStats,
    done: bool,
}

impl Catalog {
    /// Start a traversal of `prefix`.
    pub async fn open(store: &dyn ObjectStore, prefix: &str) -> Result<Self, StoreError> {
        let pager = store.list(prefix).await?;
        Ok(Self::from_pager(pager))
    }

    pub fn from_pager(pager: Box<dyn ObjectPager>) -> Self {
        Self {
            pager,
            page: VecDeque::new(),
            stats: CatalogStats::default(),
            done: false,
        }
    }

    /// Next content object, or `None` once the listing is exhausted.
    pub async fn next(&mut self) -> Result<Option<RemoteObject>, StoreError> {
        loop {
            while let Some(obj) = self.page.pop_front() {
                if obj.is_dir_marker() {
                    debug!("Skipping folder key: {}", obj.key);
                    self.stats.markers_skipped += 1;
                    continue;
                }
                self.stats.objects += 1;
                return Ok(Some(obj));
            }

            if self.done {
                return Ok(None);
            }

            match self.pager.next_page().await {
                Ok(Some(page)) => {
                    self.stats.pages += 1;
                    if page.is_empty() {
                        warn!("No files found in listing page {}", self.stats.pages);
                    } else {
                        info!("Found {} objects in page {}", page.len(), self.stats.pages);
                    }
                    self.page.extend(page);
                }
                Ok(None) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }
    }

    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }
}
