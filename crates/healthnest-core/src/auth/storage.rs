//! Durable key/value storage for the session record.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::StorageError;

/// Keychain service name for the keyring backend
const KEYRING_SERVICE: &str = "healthnest";

/// Synchronous string storage. Removing an absent key is not an error.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" => Ok(StorageBackend::Keyring),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

impl StorageBackend {
    /// Open the backend. `data_dir` is only used by the file backend.
    pub fn open(self, data_dir: PathBuf) -> Box<dyn SessionStorage> {
        debug!(backend = ?self, ?data_dir, "Opening session storage");
        match self {
            StorageBackend::File => Box::new(FileStorage::new(data_dir)),
            StorageBackend::Keyring => Box::new(KeyringStorage::new(KEYRING_SERVICE)),
            StorageBackend::Memory => Box::new(MemoryStorage::default()),
        }
    }
}

// ===== Memory =====

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

// ===== File =====

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::Undecodable(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ===== Keyring =====

/// Stores each key as a password entry in the OS keychain.
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl SessionStorage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::BadEncoding(_)) => {
                Err(StorageError::Undecodable("keychain entry is not valid UTF-8".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "healthnest-storage-{}-{}",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::default();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_storage() {
        let dir = temp_dir("roundtrip");
        let storage = FileStorage::new(dir.clone());
        assert_eq!(storage.get("session").unwrap(), None);

        storage.set("session", r#"{"id":"p1"}"#).unwrap();
        assert!(dir.join("session.json").exists());
        assert_eq!(
            storage.get("session").unwrap().as_deref(),
            Some(r#"{"id":"p1"}"#)
        );

        storage.remove("session").unwrap();
        assert!(!dir.join("session.json").exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_storage_rejects_invalid_utf8() {
        let dir = temp_dir("undecodable");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("session.json"), [0xff, 0xfe, 0x00]).unwrap();

        let storage = FileStorage::new(dir.clone());
        let err = storage.get("session").unwrap_err();
        assert!(err.is_undecodable());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_open_memory_backend_persists_within_handle() {
        let storage = StorageBackend::Memory.open(temp_dir("unused"));
        storage.set("session", "{}").unwrap();
        assert_eq!(storage.get("session").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_open_file_backend_persists_across_handles() {
        let dir = temp_dir("open-file");
        StorageBackend::File
            .open(dir.clone())
            .set("session", r#"{"id":"d1"}"#)
            .unwrap();

        let reopened = StorageBackend::File.open(dir.clone());
        assert_eq!(
            reopened.get("session").unwrap().as_deref(),
            Some(r#"{"id":"d1"}"#)
        );
        reopened.remove("session").unwrap();
        assert_eq!(reopened.get("session").unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_storage_remove_absent_key() {
        let storage = FileStorage::new(temp_dir("absent"));
        assert!(storage.remove("never-written").is_ok());
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("file".parse::<StorageBackend>(), Ok(StorageBackend::File));
        assert_eq!("Keyring".parse::<StorageBackend>(), Ok(StorageBackend::Keyring));
        assert_eq!("memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
