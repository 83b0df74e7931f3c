//! One JSON file per dataset in a data directory.

use crate::backend::{check_name, StoreBackend};
use crate::error::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores `<name>.json` files under a directory.
///
/// Writes go to a temporary sibling file that is renamed over the target, so
/// a crash mid-write leaves the previous version intact.
#[derive(Debug, Clone)]
pub struct JsonDirBackend {
    dir: PathBuf,
}

impl JsonDirBackend {
    /// Use `dir` as the data directory. It is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl StoreBackend for JsonDirBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        check_name(name)?;
        match fs::read(self.path_for(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        check_name(name)?;
        fs::create_dir_all(&self.dir).await?;

        let target = self.path_for(name);
        let tmp = self.dir.join(format!(".{name}.json.tmp"));
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &target).await?;

        tracing::debug!("Wrote dataset {} ({} bytes)", target.display(), bytes.len());
        Ok(())
    }
}
