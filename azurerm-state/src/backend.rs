//! State backend trait and error types

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::lock::LockInfo;
use crate::state::StateFile;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("State is locked by {who} (lock ID: {lock_id}, operation: {operation})")]
    Locked {
        lock_id: String,
        who: String,
        operation: String,
    },

    #[error("Lock not found: {0}")]
    LockNotFound(String),

    #[error("Lock ID mismatch: expected {expected}, got {actual}")]
    LockMismatch { expected: String, actual: String },

    /// Refuses to overwrite state that belongs to a different deployment
    #[error("State lineage mismatch: expected {expected}, got {actual}")]
    LineageMismatch { expected: String, actual: String },

    #[error("Invalid state file {path}: {source}")]
    InvalidState {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    pub fn locked(lock: &LockInfo) -> Self {
        Self::Locked {
            lock_id: lock.id.clone(),
            who: lock.who.clone(),
            operation: lock.operation.clone(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Storage for the state file, with locking for exclusive writers
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Returns `None` if no state has been written yet
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Callers bump the serial before writing
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Fails with `Locked` while another unexpired lock is held
    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo>;

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()>;

    /// Remove a stale lock by ID
    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()>;
}

/// `backend` block of the configuration file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum BackendConfig {
    Local {
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local { path: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_error_describes_holder() {
        let lock = LockInfo::new("apply");
        let error = BackendError::locked(&lock);
        let message = error.to_string();
        assert!(message.contains(&lock.who));
        assert!(message.contains("operation: apply"));
    }

    #[test]
    fn backend_config_parses_local() {
        let config: BackendConfig =
            serde_json::from_str(r#"{"type": "local", "path": "relay.state.json"}"#).unwrap();
        assert_eq!(
            config,
            BackendConfig::Local {
                path: Some(PathBuf::from("relay.state.json"))
            }
        );
        assert!(serde_json::from_str::<BackendConfig>(r#"{"type": "s3"}"#).is_err());
    }
}
