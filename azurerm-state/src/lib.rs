//! State management for the `azurerm` tool
//!
//! Records the ARM identifiers and last-read attributes of managed
//! resources so later runs can plan against them. State is stored by a
//! [`StateBackend`]; writers hold a [`LockInfo`] for the duration of a run.
//!
//! ```ignore
//! use azurerm_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::default());
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//! // ... apply changes, recording each outcome ...
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
