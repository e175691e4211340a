//! Photo ingestion pipeline.
//!
//! `upload` runs: size check, declared type check, content sniffing on a scratch
//! file, persistence of the original, best-effort thumbnail, and finally the
//! photo record. Thumbnail problems never fail an upload; they degrade to
//! "no thumbnail" (undecodable source) or "thumbnail is the original".

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use photoshare_common::{AppError, AppResult, IdGenerator, IngestionConfig, StorageService};
use photoshare_db::{
    entities::{Visibility, photo},
    repositories::PhotoRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use validator::Validate;

use super::authorization::Caller;
use super::media::{MediaConfig, MediaService, ThumbnailError};

/// An upload as received from the caller.
#[derive(Debug, Clone, Validate)]
pub struct UploadRequest {
    pub data: Vec<u8>,
    pub original_filename: String,
    /// Declared MIME type; recorded as-is on the photo.
    pub content_type: String,
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
    pub visibility: Visibility,
}

/// What happened to the thumbnail of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ThumbnailStatus {
    /// A JPEG thumbnail was written under `filename`.
    Generated { filename: String },
    /// The source could not be decoded; the photo has no thumbnail.
    Undecodable { reason: String },
    /// Rendering or writing failed; the original doubles as the thumbnail.
    Fallback { reason: String },
}

impl ThumbnailStatus {
    /// Whether a distinct thumbnail file exists.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub photo: photo::Model,
    pub thumbnail: ThumbnailStatus,
}

/// Derive the storage name for an upload: `<token>.<ext>`.
///
/// The extension comes from the original filename when it is short and
/// alphanumeric, otherwise from the declared content type.
#[must_use]
pub fn storage_filename(token: &str, original_filename: &str, content_type: &str) -> String {
    let from_name = Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase);

    let ext = from_name.unwrap_or_else(|| {
        super::media::ImageFormat::from_mime_type(content_type)
            .map_or("bin", |format| format.extension())
            .to_string()
    });

    format!("{token}.{ext}")
}

/// Scratch copy of an upload, removed when dropped.
struct ScratchFile {
    path: PathBuf,
    removed: bool,
}

impl ScratchFile {
    async fn create(dir: &Path, token: &str, data: &[u8]) -> AppResult<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::StorageFailure(format!("Failed to create scratch dir: {e}")))?;

        let scratch = Self {
            path: dir.join(format!("upload_{token}.tmp")),
            removed: false,
        };
        tokio::fs::write(&scratch.path, data)
            .await
            .map_err(|e| AppError::StorageFailure(format!("Failed to write scratch file: {e}")))?;

        Ok(scratch)
    }

    async fn remove(mut self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file");
        }
        self.removed = true;
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.removed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Photo ingestion service.
#[derive(Clone)]
pub struct IngestionService {
    photo_repo: PhotoRepository,
    storage: StorageService,
    media: MediaService,
    config: IngestionConfig,
    scratch_dir: PathBuf,
    id_gen: IdGenerator,
    permits: Arc<Semaphore>,
}

impl IngestionService {
    /// Create a new ingestion service.
    #[must_use]
    pub fn new(
        photo_repo: PhotoRepository,
        storage: StorageService,
        config: IngestionConfig,
        scratch_dir: PathBuf,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_uploads.max(1)));
        Self {
            photo_repo,
            storage,
            media: MediaService::new(MediaConfig::from(&config)),
            config,
            scratch_dir,
            id_gen: IdGenerator::new(),
            permits,
        }
    }

    /// Ingest an upload on behalf of `caller`, who becomes the photo's owner.
    pub async fn upload(
        &self,
        caller: Option<&Caller>,
        request: UploadRequest,
    ) -> AppResult<UploadOutcome> {
        let uploader = caller
            .filter(|c| c.is_active())
            .ok_or_else(|| AppError::Forbidden("Authentication required".to_string()))?;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        tokio::time::timeout(timeout, self.ingest(uploader, request))
            .await
            .map_err(|_| {
                warn!(user_id = %uploader.id, ?timeout, "Upload timed out");
                AppError::Timeout(format!("Upload did not finish within {timeout:?}"))
            })?
    }

    async fn ingest(&self, uploader: &Caller, mut request: UploadRequest) -> AppResult<UploadOutcome> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("Upload queue closed: {e}")))?;

        let size = request.data.len() as u64;
        if size == 0 {
            return Err(AppError::UnsupportedMediaType("Upload is empty".to_string()));
        }
        if size > self.config.max_upload_bytes {
            return Err(AppError::PayloadTooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }

        if !self.config.is_allowed(&request.content_type) {
            return Err(AppError::UnsupportedMediaType(request.content_type));
        }

        request.title = request.title.trim().to_string();
        request.validate()?;

        let data = Arc::new(std::mem::take(&mut request.data));

        self.verify_content(&data).await?;

        let storage_name = storage_filename(
            &self.id_gen.generate_token(),
            &request.original_filename,
            &request.content_type,
        );
        self.storage.save(&storage_name, &data).await?;
        debug!(key = %storage_name, size, "Stored original");

        let thumbnail = self.store_thumbnail(&storage_name, Arc::clone(&data)).await;
        let thumbnail_filename = match &thumbnail {
            ThumbnailStatus::Generated { filename } => Some(filename.clone()),
            ThumbnailStatus::Undecodable { .. } => None,
            ThumbnailStatus::Fallback { .. } => Some(storage_name.clone()),
        };

        let model = photo::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(uploader.id.clone()),
            title: Set(request.title),
            description: Set(request.description),
            original_filename: Set(request.original_filename),
            storage_filename: Set(storage_name.clone()),
            thumbnail_filename: Set(thumbnail_filename),
            content_type: Set(request.content_type),
            size: Set(i64::try_from(size).unwrap_or(i64::MAX)),
            visibility: Set(request.visibility),
            created_at: Set(Utc::now().into()),
        };

        let photo = match self.photo_repo.create(model).await {
            Ok(photo) => photo,
            Err(e) => {
                self.discard_files(&storage_name, &thumbnail).await;
                return Err(e);
            }
        };

        info!(
            photo_id = %photo.id,
            user_id = %photo.user_id,
            key = %photo.storage_filename,
            size,
            thumbnail = thumbnail.is_generated(),
            "Photo uploaded"
        );

        Ok(UploadOutcome { photo, thumbnail })
    }

    /// Sniff the real format from a scratch copy of the payload.
    async fn verify_content(&self, data: &Arc<Vec<u8>>) -> AppResult<()> {
        let scratch =
            ScratchFile::create(&self.scratch_dir, &self.id_gen.generate_token(), data).await?;

        let media = self.media;
        let path = scratch.path.clone();
        let sniffed = tokio::task::spawn_blocking(move || media.sniff_file(&path)).await;
        scratch.remove().await;

        let sniffed = sniffed
            .map_err(|e| AppError::Internal(format!("Content probe panicked: {e}")))??;

        match sniffed {
            Some(format) if self.config.is_allowed(format.mime_type()) => Ok(()),
            Some(format) => Err(AppError::UnsupportedMediaType(format.mime_type().to_string())),
            None => Err(AppError::UnsupportedMediaType(
                "Content is not a supported image".to_string(),
            )),
        }
    }

    async fn store_thumbnail(&self, storage_name: &str, data: Arc<Vec<u8>>) -> ThumbnailStatus {
        let media = self.media;
        let rendered = tokio::task::spawn_blocking(move || media.generate_thumbnail(&data)).await;

        let processed = match rendered {
            Ok(Ok(processed)) => processed,
            Ok(Err(ThumbnailError::Decode(reason))) => {
                warn!(key = %storage_name, %reason, "Source not decodable, no thumbnail");
                return ThumbnailStatus::Undecodable { reason };
            }
            Ok(Err(e @ ThumbnailError::Render(_))) => {
                warn!(key = %storage_name, error = %e, "Thumbnail rendering failed, using original");
                return ThumbnailStatus::Fallback {
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                warn!(key = %storage_name, error = %e, "Thumbnail task failed, using original");
                return ThumbnailStatus::Fallback {
                    reason: e.to_string(),
                };
            }
        };

        let filename = format!("{}{storage_name}", self.config.thumbnail_prefix);
        match self.storage.save(&filename, &processed.data).await {
            Ok(()) => {
                debug!(
                    key = %filename,
                    width = processed.dimensions.width,
                    height = processed.dimensions.height,
                    "Stored thumbnail"
                );
                ThumbnailStatus::Generated { filename }
            }
            Err(e) => {
                warn!(key = %filename, error = %e, "Failed to store thumbnail, using original");
                ThumbnailStatus::Fallback {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn discard_files(&self, storage_name: &str, thumbnail: &ThumbnailStatus) {
        let mut keys = vec![storage_name];
        if let ThumbnailStatus::Generated { filename } = thumbnail {
            keys.push(filename);
        }
        for key in keys {
            if let Err(e) = self.storage.delete(key).await {
                warn!(key = %key, error = %e, "Failed to remove orphaned upload file");
            }
        }
    }

    /// Active ingestion configuration.
    #[must_use]
    pub const fn config(&self) -> &IngestionConfig {
        &self.config
    }
}
