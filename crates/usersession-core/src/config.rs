//! Application configuration management.
//!
//! Settings are selected per environment profile (`development`,
//! `production`, ...) and cover the authentication endpoint and where the
//! session record is kept.
//!
//! Configuration is stored at `~/.config/usersession/config.json`, and
//! `USERSESSION_*` environment variables override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::{DEFAULT_AUTH_PATH, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::api::ApiClient;
use crate::storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "usersession";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

pub const ENV_ENVIRONMENT: &str = "USERSESSION_ENV";
pub const ENV_API_URL: &str = "USERSESSION_API_URL";
pub const ENV_AUTH_PATH: &str = "USERSESSION_AUTH_PATH";
pub const ENV_STORAGE: &str = "USERSESSION_STORAGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" => Ok(StorageBackend::Keyring),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: String,
    pub api_base_url: String,
    pub auth_path: String,
    pub request_timeout_secs: u64,
    pub storage: StorageBackend,
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_path: DEFAULT_AUTH_PATH.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            storage: StorageBackend::default(),
            storage_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Override fields from `USERSESSION_*` variables looked up through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(env) = var(ENV_ENVIRONMENT) {
            self.environment = env;
        }
        if let Some(url) = var(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(path) = var(ENV_AUTH_PATH) {
            self.auth_path = path;
        }
        if let Some(storage) = var(ENV_STORAGE) {
            self.storage = storage
                .parse()
                .with_context(|| format!("Invalid {}", ENV_STORAGE))?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the file backend; each environment gets its own
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(&self.environment))
    }

    /// Keychain service name; environments do not share entries
    pub fn keyring_service(&self) -> String {
        format!("{}-{}", APP_NAME, self.environment)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Open the configured persistence backend
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStore + Send + Sync>> {
        Ok(match self.storage {
            StorageBackend::File => {
                let dir = self.storage_dir()?;
                Box::new(FileStore::new(dir).context("Failed to open storage directory")?)
            }
            StorageBackend::Keyring => Box::new(KeyringStore::new(self.keyring_service())),
            StorageBackend::Memory => Box::new(MemoryStore::new()),
        })
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::with_options(
            self.api_base_url.clone(),
            self.auth_path.clone(),
            self.request_timeout(),
        )
    }
}
