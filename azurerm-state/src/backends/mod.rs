//! Backend implementations for state storage

mod local;

pub use local::LocalBackend;

use crate::backend::{BackendConfig, StateBackend};

/// Build the backend selected by a `backend` configuration block
pub fn create_backend(config: &BackendConfig) -> Box<dyn StateBackend> {
    match config {
        BackendConfig::Local { path } => Box::new(match path {
            Some(path) => LocalBackend::new(path),
            None => LocalBackend::default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateFile;

    #[tokio::test]
    async fn local_backend_uses_configured_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("relay.state.json");
        let backend = create_backend(&BackendConfig::Local {
            path: Some(path.clone()),
        });

        backend.write_state(&StateFile::new()).await.unwrap();
        assert!(path.exists());
    }
}
