pub mod backend;
pub mod s3;
pub mod types;

pub use backend::{ObjectPager, ObjectStore, S3Provider, StoreError};
pub use s3::S3Store;
pub use types::*;
