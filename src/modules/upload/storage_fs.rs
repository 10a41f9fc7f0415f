use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{api::error, modules::upload::storage::FileStorage};

/// Creates `root` and every `root/<folder>`. Safe to call repeatedly.
pub async fn ensure_layout(root: &Path, folders: &[String]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(root).await?;
    for folder in folders {
        tokio::fs::create_dir_all(root.join(folder)).await?;
    }
    log::info!("Upload layout ready under {}", root.display());
    Ok(())
}

#[derive(Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, folder: &str, filename: &str) -> PathBuf {
        self.root.join(folder).join(filename)
    }
}

#[async_trait::async_trait]
impl FileStorage for FsStorage {
    async fn write(
        &self,
        folder: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), error::SystemError> {
        // Folders outside the pre-created layout are made on demand
        tokio::fs::create_dir_all(self.root.join(folder)).await?;

        let path = self.path_of(folder, filename);
        tokio::fs::write(&path, bytes).await?;

        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    async fn read(
        &self,
        folder: &str,
        filename: &str,
    ) -> Result<Option<Vec<u8>>, error::SystemError> {
        match tokio::fs::read(self.path_of(folder, filename)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, folder: &str, filename: &str) -> Result<bool, error::SystemError> {
        match tokio::fs::remove_file(self.path_of(folder, filename)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
