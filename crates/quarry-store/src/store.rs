//! Typed dataset persistence.

use crate::backend::StoreBackend;
use crate::error::{Result, StoreError};
use crate::file::JsonDirBackend;
use crate::sqlite::SqliteBackend;
use quarry_core::{StoreBackendKind, StoreConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Canonical profile dataset.
pub const PROFILE_DATASET: &str = "profile_data";
/// Canonical job dataset.
pub const JOB_DATASET: &str = "job_data";
/// Quota ledger.
pub const LEDGER_DATASET: &str = "ledger";

/// File name of the `SQLite` database inside the data directory.
pub const DATABASE_FILE: &str = "quarry.db";

/// Dataset that receives the bytes of `name` when they fail to decode.
#[must_use]
pub fn corrupt_copy_name(name: &str) -> String {
    format!("{name}_corrupt")
}

/// Loads and saves named datasets as JSON documents.
#[derive(Debug)]
pub struct Store {
    backend: Box<dyn StoreBackend>,
}

impl Store {
    /// Wrap a backend.
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Open the backend selected by configuration under `data_dir`.
    pub async fn open(config: &StoreConfig, data_dir: &Path) -> Result<Self> {
        match config.backend {
            StoreBackendKind::Json => {
                info!(dir = %data_dir.display(), "using JSON dataset store");
                Ok(Self::new(JsonDirBackend::new(data_dir)))
            }
            StoreBackendKind::Sqlite => {
                let backend = SqliteBackend::open(data_dir.join(DATABASE_FILE)).await?;
                Ok(Self::new(backend))
            }
        }
    }

    /// Load a dataset, or `None` if it was never saved.
    ///
    /// # Errors
    /// Returns `StoreError::Corrupt` if the stored bytes do not decode.
    pub async fn try_load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let Some(bytes) = self.backend.read(name).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                name: name.to_string(),
                source,
            })
    }

    /// Load a dataset, falling back to an empty one.
    ///
    /// Missing and corrupt data both yield `T::default()`. Corrupt bytes are
    /// first copied to the dataset named by [`corrupt_copy_name`], so the
    /// next save does not destroy them. Backend failures still propagate.
    pub async fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let Some(bytes) = self.backend.read(name).await? else {
            debug!(dataset = name, "dataset not found, starting empty");
            return Ok(T::default());
        };

        match serde_json::from_slice(&bytes) {
            Ok(dataset) => Ok(dataset),
            Err(source) => {
                let copy = corrupt_copy_name(name);
                self.backend.write(&copy, &bytes).await?;
                warn!(
                    dataset = name,
                    copy = %copy,
                    error = %source,
                    "dataset is corrupt, kept a copy and starting empty"
                );
                Ok(T::default())
            }
        }
    }

    /// Replace a dataset with `value`.
    pub async fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialize {
            name: name.to_string(),
            source,
        })?;
        self.backend.write(name, &bytes).await?;
        debug!(dataset = name, bytes = bytes.len(), "dataset saved");
        Ok(())
    }

    /// Write raw bytes, bypassing encoding.
    pub async fn save_raw(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.backend.write(name, bytes).await
    }
}
