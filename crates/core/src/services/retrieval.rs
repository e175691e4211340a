//! Media retrieval, gated by the view decision.

use photoshare_common::{AppResult, StorageService};
use serde::Serialize;
use tracing::{debug, warn};

use super::authorization::{AuthorizationService, Caller, PhotoAction};
use super::media::ImageFormat;

/// Stored bytes together with the content type to serve them as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBytes {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Media retrieval service.
#[derive(Clone)]
pub struct MediaRetrievalService {
    authz: AuthorizationService,
    storage: StorageService,
}

impl MediaRetrievalService {
    /// Create a new retrieval service.
    #[must_use]
    pub fn new(authz: AuthorizationService, storage: StorageService) -> Self {
        Self { authz, storage }
    }

    /// Bytes of the original upload.
    pub async fn get_original_bytes(
        &self,
        photo_id: &str,
        caller: Option<&Caller>,
    ) -> AppResult<MediaBytes> {
        let photo = self
            .authz
            .require_photo(caller, photo_id, PhotoAction::View)
            .await?;

        let data = self.storage.load(&photo.storage_filename).await?;
        debug!(photo_id = %photo_id, bytes = data.len(), "Serving original");

        Ok(MediaBytes {
            data,
            content_type: photo.content_type,
        })
    }

    /// Bytes of the thumbnail, or of the original when there is no distinct one.
    pub async fn get_thumbnail_bytes(
        &self,
        photo_id: &str,
        caller: Option<&Caller>,
    ) -> AppResult<MediaBytes> {
        let photo = self
            .authz
            .require_photo(caller, photo_id, PhotoAction::View)
            .await?;

        if photo.has_distinct_thumbnail()
            && let Some(thumbnail) = photo.thumbnail_filename.as_deref()
            && self.thumbnail_present(photo_id, thumbnail).await
        {
            let data = self.storage.load(thumbnail).await?;
            debug!(photo_id = %photo_id, bytes = data.len(), "Serving thumbnail");
            return Ok(MediaBytes {
                data,
                content_type: ImageFormat::Jpeg.mime_type().to_string(),
            });
        }

        let data = self.storage.load(&photo.storage_filename).await?;
        debug!(photo_id = %photo_id, bytes = data.len(), "No thumbnail, serving original");
        Ok(MediaBytes {
            data,
            content_type: photo.content_type,
        })
    }

    /// A thumbnail that cannot be checked is treated as absent.
    async fn thumbnail_present(&self, photo_id: &str, key: &str) -> bool {
        match self.storage.exists(key).await {
            Ok(present) => present,
            Err(e) => {
                warn!(photo_id = %photo_id, key = %key, error = %e, "Thumbnail check failed");
                false
            }
        }
    }
}
