//! Raw byte storage behind the typed [`crate::Store`].

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Named blob storage.
///
/// Backends move bytes only; encoding and corruption recovery live in
/// [`crate::Store`].
#[async_trait]
pub trait StoreBackend: Send + Sync + std::fmt::Debug {
    /// Read a dataset's bytes, or `None` if it was never written.
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a dataset's bytes.
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Reject names that are not safe as file names or keys.
pub(crate) fn check_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// Process-local backend, used in tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    datasets: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        check_name(name)?;
        Ok(self.datasets.lock().await.get(name).cloned())
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        self.datasets
            .lock()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}
