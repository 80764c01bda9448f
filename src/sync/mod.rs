//! Remote-to-local sync: catalog traversal, change detection and downloads.

pub mod catalog;
pub mod detect;
pub mod engine;
pub mod executor;
pub mod hash;
pub mod paths;

pub use catalog::{Catalog, CatalogStats};
pub use detect::{decide, DownloadReason, LocalFile, SkipReason, SyncDecision};
pub use engine::{
    FailedObject, ObjectOutcome, SyncContext, SyncEngine, SyncOutcome, SyncReport, SyncStats,
};
pub use executor::DownloadExecutor;
pub use hash::{md5_bytes, md5_file};
pub use paths::local_path_for;
