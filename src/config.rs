//! JSON configuration for a sync run.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_LOCAL_DIR: &str = "./downloaded";

/// Settings read from the config file.
#[derive(Clone, Deserialize)]
pub struct SyncConfig {
    pub access_key: String,
    pub secret_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
    /// Endpoint of an S3-compatible provider (MinIO, R2, ...)
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_DIR)
}

impl SyncConfig {
    /// Load and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.access_key.trim().is_empty() {
            return Err(ConfigError::Empty("access_key"));
        }
        if self.secret_key.trim().is_empty() {
            return Err(ConfigError::Empty("secret_key"));
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Empty("bucket"));
        }
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, prefix: Option<String>, local_dir: Option<PathBuf>) -> Self {
        if let Some(prefix) = prefix {
            self.prefix = prefix;
        }
        if let Some(local_dir) = local_dir {
            self.local_dir = local_dir;
        }
        self
    }
}

// Credentials stay out of log output.
impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("access_key", &"***")
            .field("secret_key", &"***")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("local_dir", &self.local_dir)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
