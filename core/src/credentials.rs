//! Key-value persistence for the bearer credential.
//!
//! The facade only needs `get`/`set`/`remove` on a string key, so the store is
//! a trait and the environment decides where values live. Both stores here
//! are single cells per key: the last writer wins.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;

/// Key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk, so a login survives restarts.
///
/// A missing file reads as an empty store. Every write replaces the whole
/// file through a sibling temp file and a rename, so readers never see a
/// torn write; the internal lock keeps read-modify-write cycles from
/// interleaving. A file that no longer parses is reported by `get` and
/// discarded by `set` and `remove`, so logging out always recovers.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like `load`, but a corrupt file is treated as empty.
    async fn load_for_write(&self) -> Result<HashMap<String, String>, StoreError> {
        match self.load().await {
            Err(StoreError::Format(err)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "discarding corrupt credential file"
                );
                Ok(HashMap::new())
            }
            other => other,
        }
    }

    async fn save(&self, values: &HashMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(values)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut values = self.load_for_write().await?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut values = match self.load().await {
            Ok(values) => values,
            Err(StoreError::Format(err)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "resetting corrupt credential file"
                );
                return self.save(&HashMap::new()).await;
            }
            Err(err) => return Err(err),
        };
        if values.remove(key).is_some() {
            self.save(&values).await?;
        }
        Ok(())
    }
}
