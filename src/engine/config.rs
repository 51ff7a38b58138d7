// ── Bridge Engine: Configuration ───────────────────────────────────────────
//
// Defaults live in atoms::constants. A TOML file may override any subset of
// fields; `MEMORY_BRIDGE_DIR` overrides the storage directory last.

use crate::atoms::constants::{
    DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_RESULTS, DEFAULT_PERSIST_WORKERS, RELEVANCE_THRESHOLD,
    STORAGE_DIR_ENV,
};
use crate::atoms::error::{BridgeError, BridgeResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime configuration for a `FragmentStore`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directory holding one `<id>.json` record per fragment. Created if absent.
    pub storage_dir: PathBuf,
    /// Size of the blocking pool that performs durable writes.
    pub persist_workers: usize,
    /// Buffered persistence events per subscriber before it starts lagging.
    pub event_capacity: usize,
    /// Minimum (exclusive) Jaccard relevance for retrieval.
    pub relevance_threshold: f64,
    /// Result count used by `FragmentStore::recall`.
    pub default_max_results: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            persist_workers: DEFAULT_PERSIST_WORKERS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            relevance_threshold: RELEVANCE_THRESHOLD,
            default_max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// `<data dir>/memory-bridge/fragments`, or a relative path if the platform
/// has no data directory.
fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memory-bridge")
        .join("fragments")
}

impl BridgeConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> BridgeResult<Self> {
        let config: BridgeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, then apply the environment override.
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env();
        log::info!("[bridge::config] Loaded {} (storage_dir={})", path.display(), config.storage_dir.display());
        Ok(config)
    }

    /// Defaults plus the environment override.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn with_persist_workers(mut self, workers: usize) -> Self {
        self.persist_workers = workers;
        self
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(STORAGE_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.storage_dir = PathBuf::from(dir);
            }
        }
    }

    /// Reject values the store cannot run with.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.persist_workers == 0 {
            return Err(BridgeError::Config("persist_workers must be at least 1".into()));
        }
        if self.event_capacity == 0 {
            return Err(BridgeError::Config("event_capacity must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err(BridgeError::Config(format!(
                "relevance_threshold must be within [0, 1], got {}",
                self.relevance_threshold
            )));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(BridgeError::Config("storage_dir must not be empty".into()));
        }
        Ok(())
    }
}
