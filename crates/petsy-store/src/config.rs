//! # Store Configuration
//!
//! Where the store keeps its data, how long it waits on storage, and which
//! backend (if any) it asks to validate a rehydrated session.
//!
//! ## Configuration Sources (in priority order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PETSY_STORAGE_BACKEND, PETSY_DB_PATH, PETSY_STORAGE_TIMEOUT_MS,    │
//! │     PETSY_BACKEND_URL, PETSY_VALIDATE_SESSION, PETSY_MAILBOX_CAPACITY  │
//! │                                                                         │
//! │  2. Config File (<config dir>/config.toml)                             │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use petsy_storage::{Database, DbConfig, KeyValueStorage, MemoryStorage};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Storage Settings
// =============================================================================

/// Which [`KeyValueStorage`] implementation backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// SQLite file in the platform data directory.
    #[default]
    Sqlite,
    /// Process-local map; nothing survives a restart.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "file" => Ok(StorageBackend::Sqlite),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            other => Err(StoreError::InvalidConfig(format!(
                "Unknown storage backend: '{}'. Valid options: sqlite, memory",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite file path. Defaults to `<data dir>/petsy.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Upper bound on any single storage call (milliseconds).
    #[serde(default = "default_storage_timeout")]
    pub timeout_ms: u64,
}

fn default_storage_timeout() -> u64 {
    5000
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            backend: StorageBackend::default(),
            path: None,
            timeout_ms: default_storage_timeout(),
        }
    }
}

impl StorageSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolved SQLite path: explicit path, else the platform data dir.
    pub fn database_path(&self) -> StoreResult<PathBuf> {
        self.path
            .clone()
            .or_else(default_database_path)
            .ok_or_else(|| StoreError::InvalidConfig("No database path available".into()))
    }

    /// Opens the configured backend.
    pub async fn open(&self) -> StoreResult<Arc<dyn KeyValueStorage>> {
        match self.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Ok(Arc::new(MemoryStorage::new()))
            }
            StorageBackend::Sqlite => {
                let path = self.database_path()?;
                let db = Database::new(DbConfig::new(path)).await?;
                Ok(Arc::new(db.kv()))
            }
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// REST backend base URL, e.g. `https://api.petsy.app`.
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Check a rehydrated token against `/api/auth/me` at startup.
    #[serde(default = "default_true")]
    pub validate_on_startup: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            backend_url: None,
            validate_on_startup: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SessionSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The backend URL to validate against, if validation is enabled.
    pub fn validation_url(&self) -> Option<&str> {
        if self.validate_on_startup {
            self.backend_url.as_deref()
        } else {
            None
        }
    }
}

// =============================================================================
// Actor Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSettings {
    /// Bounded command channel size. Senders wait when it is full.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
}

fn default_mailbox_capacity() -> usize {
    64
}

impl Default for ActorSettings {
    fn default() -> Self {
        ActorSettings {
            mailbox_capacity: default_mailbox_capacity(),
        }
    }
}

// =============================================================================
// Main Store Configuration
// =============================================================================

/// Complete store configuration.
///
/// ## Example Config File
/// ```toml
/// [storage]
/// backend = "sqlite"
/// path = "/home/sara/.local/share/petsy/petsy.db"
/// timeout_ms = 5000
///
/// [session]
/// backend_url = "https://api.petsy.app"
/// validate_on_startup = true
/// request_timeout_secs = 10
///
/// [store]
/// mailbox_capacity = 64
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub store: ActorSettings,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with in-memory storage and no session validation.
    pub fn in_memory() -> Self {
        StoreConfig {
            storage: StorageSettings {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (config.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file as pretty TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if let Some(ref raw) = self.session.backend_url {
            let url = Url::parse(raw)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(StoreError::InvalidUrl(format!(
                    "Backend URL must use http:// or https://, got: {}",
                    raw
                )));
            }
        }

        if self.storage.timeout_ms == 0 {
            return Err(StoreError::InvalidConfig(
                "storage.timeout_ms must be greater than 0".into(),
            ));
        }

        if self.session.request_timeout_secs == 0 {
            return Err(StoreError::InvalidConfig(
                "session.request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.store.mailbox_capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "store.mailbox_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `PETSY_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = var("PETSY_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(_) => warn!(backend = %backend, "Unknown storage backend in environment"),
            }
        }

        if let Some(path) = var("PETSY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Some(ms) = var("PETSY_STORAGE_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse::<u64>() {
                self.storage.timeout_ms = ms;
            }
        }

        if let Some(url) = var("PETSY_BACKEND_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.session.backend_url = Some(url);
        }

        if let Some(flag) = var("PETSY_VALIDATE_SESSION") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.session.validate_on_startup = true,
                "0" | "false" | "no" | "off" => self.session.validate_on_startup = false,
                _ => warn!(value = %flag, "Unknown PETSY_VALIDATE_SESSION value"),
            }
        }

        if let Some(capacity) = var("PETSY_MAILBOX_CAPACITY") {
            if let Ok(c) = capacity.parse::<usize>() {
                debug!(capacity = c, "Overriding mailbox capacity from environment");
                self.store.mailbox_capacity = c;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "petsy", "app")
}

/// Platform data directory database path.
///
/// - **macOS**: `~/Library/Application Support/com.petsy.app/petsy.db`
/// - **Linux**: `~/.local/share/app/petsy.db`
/// - **Windows**: `%APPDATA%\petsy\app\data\petsy.db`
fn default_database_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("petsy.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("sqlite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert_eq!("MEMORY".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.timeout(), Duration::from_secs(5));
        assert_eq!(config.store.mailbox_capacity, 64);
        assert!(config.session.backend_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = StoreConfig::default();

        config.session.backend_url = Some("not a url".into());
        assert!(config.validate().is_err());

        config.session.backend_url = Some("ftp://api.petsy.app".into());
        assert!(matches!(config.validate(), Err(StoreError::InvalidUrl(_))));

        config.session.backend_url = Some("https://api.petsy.app".into());
        assert!(config.validate().is_ok());

        config.store.mailbox_capacity = 0;
        assert!(config.validate().is_err());

        config.store.mailbox_capacity = 8;
        config.storage.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = StoreConfig::default();
        config.apply_overrides(env(&[
            ("PETSY_STORAGE_BACKEND", "memory"),
            ("PETSY_DB_PATH", "/tmp/petsy-test.db"),
            ("PETSY_STORAGE_TIMEOUT_MS", "250"),
            ("PETSY_BACKEND_URL", "http://localhost:8001"),
            ("PETSY_VALIDATE_SESSION", "off"),
            ("PETSY_MAILBOX_CAPACITY", "16"),
        ]));

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/petsy-test.db")));
        assert_eq!(config.storage.timeout_ms, 250);
        assert_eq!(config.session.backend_url.as_deref(), Some("http://localhost:8001"));
        assert!(!config.session.validate_on_startup);
        assert_eq!(config.session.validation_url(), None);
        assert_eq!(config.store.mailbox_capacity, 16);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = StoreConfig::default();
        config.apply_overrides(env(&[
            ("PETSY_STORAGE_BACKEND", "redis"),
            ("PETSY_MAILBOX_CAPACITY", "lots"),
        ]));

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.store.mailbox_capacity, 64);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = StoreConfig::in_memory();
        config.session.backend_url = Some("https://api.petsy.app".into());
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[storage]"));
        assert!(contents.contains("[session]"));
        assert!(contents.contains("[store]"));

        let loaded: StoreConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.storage.backend, StorageBackend::Memory);
        assert_eq!(loaded.session.validation_url(), Some("https://api.petsy.app"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: StoreConfig = toml::from_str("[session]\nbackend_url = \"http://localhost:8001\"\n").unwrap();
        assert!(config.session.validate_on_startup);
        assert_eq!(config.session.request_timeout_secs, 10);
        assert_eq!(config.storage.timeout_ms, 5000);
    }

    #[tokio::test]
    async fn test_open_sqlite_at_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StorageSettings {
            path: Some(dir.path().join("petsy.db")),
            ..Default::default()
        };

        let storage = settings.open().await.unwrap();
        assert_eq!(storage.backend_name(), "sqlite");
        storage.set("language", "ar").await.unwrap();
        assert_eq!(storage.get("language").await.unwrap().as_deref(), Some("ar"));
    }
}
