//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the session storage backend, the simulated network
//! latency, the secret hashing cost, and the last signed-in email.
//!
//! Configuration is stored at `~/.config/healthnest/config.json`. Any
//! field can be overridden from the environment (`HEALTHNEST_*`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argon2::Params;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{CredentialStore, SessionManager, StorageBackend};
use crate::navigation::Navigator;
use crate::notify::Notifier;

/// Application name used for config/data directory paths
const APP_NAME: &str = "healthnest";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default delay standing in for a sign-in round trip.
const DEFAULT_LATENCY_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageBackend,
    pub simulated_latency_ms: u64,
    pub last_email: Option<String>,
    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,
    /// Argon2 iteration count
    pub hash_iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            simulated_latency_ms: DEFAULT_LATENCY_MS,
            last_email: None,
            hash_memory_kib: Params::DEFAULT_M_COST,
            hash_iterations: Params::DEFAULT_T_COST,
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load the config file alone, without environment overrides. Use this
    /// when the result will be saved back.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read config file")?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `HEALTHNEST_*` overrides. Unparseable values are logged and
    /// ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("HEALTHNEST_STORAGE") {
            match value.parse() {
                Ok(backend) => self.storage = backend,
                Err(e) => warn!(error = %e, "Ignoring HEALTHNEST_STORAGE"),
            }
        }
        if let Some(value) = lookup("HEALTHNEST_LATENCY_MS") {
            match value.trim().parse() {
                Ok(ms) => self.simulated_latency_ms = ms,
                Err(e) => warn!(error = %e, value = %value, "Ignoring HEALTHNEST_LATENCY_MS"),
            }
        }
        if let Some(email) = lookup("HEALTHNEST_EMAIL") {
            self.last_email = Some(email);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session file and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }

    pub fn hash_params(&self) -> Result<Params> {
        Params::new(self.hash_memory_kib, self.hash_iterations, 1, None)
            .map_err(|e| anyhow::anyhow!("Invalid hashing parameters: {}", e))
    }

    /// Build a session manager with the demo accounts, the configured
    /// storage backend and latency. The session is not restored yet.
    pub fn session_manager(
        &self,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<SessionManager> {
        let credentials = CredentialStore::with_demo_accounts(self.hash_params()?)
            .context("Failed to seed demo accounts")?;
        let storage = self.storage.open(self.data_dir()?);
        Ok(SessionManager::new(credentials, storage, navigator, notifier).with_latency(self.latency()))
    }
}

// ============================================================================
// Tests
// ============================================================================
