use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Key of the flag that lets a relaunch skip onboarding
pub const VERIFIED_FLAG: &str = "scissher_verified";

/// Errors that can occur when reading or writing local flags
#[derive(Debug, Error)]
pub enum FlagStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt flag file: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Flag store lock poisoned")]
    Poisoned,
}

/// Local key/value flags, the equivalent of the webview's local storage
pub trait FlagStore: Send + Sync {
    fn get(&self, key: &str) -> Result<bool, FlagStoreError>;
    fn set(&self, key: &str, value: bool) -> Result<(), FlagStoreError>;
    fn remove(&self, key: &str) -> Result<(), FlagStoreError>;

    fn is_verified(&self) -> bool {
        self.get(VERIFIED_FLAG).unwrap_or_else(|e| {
            tracing::warn!("Failed to read verified flag, treating as unverified: {}", e);
            false
        })
    }

    fn set_verified(&self, verified: bool) -> Result<(), FlagStoreError> {
        if verified {
            self.set(VERIFIED_FLAG, true)
        } else {
            self.remove(VERIFIED_FLAG)
        }
    }
}

/// Flags kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: Mutex<BTreeMap<String, bool>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Result<bool, FlagStoreError> {
        let flags = self.flags.lock().map_err(|_| FlagStoreError::Poisoned)?;
        Ok(flags.get(key).copied().unwrap_or(false))
    }

    fn set(&self, key: &str, value: bool) -> Result<(), FlagStoreError> {
        let mut flags = self.flags.lock().map_err(|_| FlagStoreError::Poisoned)?;
        flags.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), FlagStoreError> {
        let mut flags = self.flags.lock().map_err(|_| FlagStoreError::Poisoned)?;
        flags.remove(key);
        Ok(())
    }
}

/// Flags persisted as a flat JSON object on disk
#[derive(Debug)]
pub struct FileFlagStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data dir>/scissher/flags.json`, or the working directory when the
    /// platform has no data dir
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scissher")
            .join("flags.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, bool>, FlagStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, flags: &BTreeMap<String, bool>) -> Result<(), FlagStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(flags)?)?;
        Ok(())
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> Result<bool, FlagStoreError> {
        let _guard = self.lock.lock().map_err(|_| FlagStoreError::Poisoned)?;
        Ok(self.read_all()?.get(key).copied().unwrap_or(false))
    }

    fn set(&self, key: &str, value: bool) -> Result<(), FlagStoreError> {
        let _guard = self.lock.lock().map_err(|_| FlagStoreError::Poisoned)?;
        let mut flags = self.read_all()?;
        flags.insert(key.to_string(), value);
        self.write_all(&flags)
    }

    fn remove(&self, key: &str) -> Result<(), FlagStoreError> {
        let _guard = self.lock.lock().map_err(|_| FlagStoreError::Poisoned)?;
        let mut flags = self.read_all()?;
        if flags.remove(key).is_some() {
            self.write_all(&flags)?;
        }
        Ok(())
    }
}
