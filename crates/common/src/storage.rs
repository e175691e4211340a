//! File storage abstraction for uploaded photos and derived thumbnails.
//!
//! Keys are flat file names generated by the upload pipeline; they never contain
//! path separators.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{AppError, AppResult};

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write `data` under `key`, replacing any previous content.
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()>;

    /// Read the bytes stored under `key`.
    ///
    /// Returns [`AppError::NotFound`] when nothing is stored under `key`.
    async fn load(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Delete a file. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Shared handle to a storage backend.
pub type StorageService = Arc<dyn StorageBackend>;

/// Local filesystem storage backend rooted at the upload directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Wrap this backend in a [`StorageService`] handle.
    #[must_use]
    pub fn into_service(self) -> StorageService {
        Arc::new(self)
    }

    /// Root directory of this backend.
    #[must_use]
    pub const fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn get_path(&self, key: &str) -> AppResult<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key == "."
            || key == ".."
        {
            return Err(AppError::InvalidArgument(format!(
                "Invalid storage key: {key}"
            )));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let path = self.get_path(key)?;

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::StorageFailure(format!("Failed to create directory: {e}")))?;

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::StorageFailure(format!("Failed to write file: {e}")))?;

        Ok(())
    }

    async fn load(&self, key: &str) -> AppResult<Vec<u8>> {
        let path = self.get_path(key)?;

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Stored file: {key}")))
            }
            Err(e) => Err(AppError::StorageFailure(format!("Failed to read file: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.get_path(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageFailure(format!("Failed to delete file: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.get_path(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::StorageFailure(format!("Failed to stat file: {e}")))
    }
}
