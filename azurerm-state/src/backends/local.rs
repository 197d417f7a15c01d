//! Local file backend
//!
//! State lives in a JSON file (default `azurerm.state.json`); the lock is a
//! sibling `.lock` file created exclusively.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::backend::{BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

pub struct LocalBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "azurerm.state.json";

    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        let state_path = state_path.into();
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    async fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        match tokio::fs::read_to_string(&self.lock_path).await {
            Ok(content) => Ok(serde_json::from_str(&content).ok()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::io(&self.lock_path, e)),
        }
    }

    async fn create_lock_file(&self, lock: &LockInfo) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
            .await?;
        let content = serde_json::to_vec_pretty(lock)?;
        file.write_all(&content).await?;
        file.flush().await
    }

    async fn remove_lock_file(&self) -> BackendResult<()> {
        tokio::fs::remove_file(&self.lock_path)
            .await
            .map_err(|e| BackendError::io(&self.lock_path, e))
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STATE_FILE)
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let content = match tokio::fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::io(&self.state_path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| BackendError::InvalidState {
                path: self.state_path.clone(),
                source,
            })
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(existing) = self.read_state().await? {
            if existing.lineage != state.lineage {
                return Err(BackendError::LineageMismatch {
                    expected: existing.lineage,
                    actual: state.lineage.clone(),
                });
            }
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp_path = self.state_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .map_err(|e| BackendError::io(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &self.state_path)
            .await
            .map_err(|e| BackendError::io(&self.state_path, e))?;
        tracing::debug!(path = %self.state_path.display(), serial = state.serial, "wrote state");
        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        let lock = LockInfo::new(operation);
        match self.create_lock_file(&lock).await {
            Ok(()) => return Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(BackendError::io(&self.lock_path, e)),
        }

        if let Some(existing) = self.read_lock().await? {
            if !existing.is_expired() {
                return Err(BackendError::locked(&existing));
            }
        }

        tracing::warn!(path = %self.lock_path.display(), "replacing expired or unreadable lock");
        self.remove_lock_file().await?;
        self.create_lock_file(&lock)
            .await
            .map_err(|e| BackendError::io(&self.lock_path, e))?;
        Ok(lock)
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let Some(current) = self.read_lock().await? else {
            return Err(BackendError::LockNotFound(lock.id.clone()));
        };
        if current.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: current.id,
                actual: lock.id.clone(),
            });
        }
        self.remove_lock_file().await
    }

    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()> {
        match self.read_lock().await? {
            Some(current) if current.id == lock_id => self.remove_lock_file().await,
            Some(current) => Err(BackendError::LockMismatch {
                expected: current.id,
                actual: lock_id.to_string(),
            }),
            None => Err(BackendError::LockNotFound(lock_id.to_string())),
        }
    }
}
