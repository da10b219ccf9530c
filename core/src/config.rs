//! Client settings loaded from defaults, an optional `blog-client.toml`,
//! and `BLOG_CLIENT__*` environment variables, in that order.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::storage::{FileStore, StorageError};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STATE_DIR: &str = ".blog-client";

/// Client settings: where the API lives, how long to wait, and where
/// persisted store state goes.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub state_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("state_dir", DEFAULT_STATE_DIR)?
            // Load from ./blog-client.toml
            .add_source(File::with_name("blog-client").required(false))
            // Override from environment (e.g., BLOG_CLIENT__BASE_URL)
            .add_source(Environment::with_prefix("BLOG_CLIENT").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// File-backed persistence rooted at `state_dir`.
    pub fn open_storage(&self) -> Result<FileStore, StorageError> {
        FileStore::open(&self.state_dir)
    }
}
