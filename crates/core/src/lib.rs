//! Core business logic for photoshare.
//!
//! The authorization engine decides who may view, edit, delete or comment on a
//! photo; the sharing ledger records per-user grants; the ingestion pipeline
//! turns uploads into stored originals, thumbnails and photo records. The
//! remaining services compose those three.

pub mod services;

pub use services::*;

use std::sync::Arc;

use photoshare_common::{Config, LocalStorage, StorageService};
use photoshare_db::repositories::{
    AlbumRepository, CommentRepository, PhotoRepository, ShareRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

/// Every service, wired over one connection and one storage backend.
#[derive(Clone)]
#[allow(missing_docs)]
pub struct Services {
    pub authorization: AuthorizationService,
    pub sharing: SharingService,
    pub ingestion: IngestionService,
    pub retrieval: MediaRetrievalService,
    pub photos: PhotoService,
    pub albums: AlbumService,
    pub comments: CommentService,
    pub users: UserAdminService,
}

impl Services {
    /// Build services from configuration, storing files under `storage.upload_root`.
    #[must_use]
    pub fn from_config(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let storage = LocalStorage::new(config.storage.upload_root.clone()).into_service();
        Self::new(db, storage, config)
    }

    /// Build services with an explicit storage backend.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, storage: StorageService, config: &Config) -> Self {
        let photo_repo = PhotoRepository::new(Arc::clone(&db));
        let album_repo = AlbumRepository::new(Arc::clone(&db));
        let share_repo = ShareRepository::new(Arc::clone(&db));
        let user_repo = UserRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(db);

        let authorization =
            AuthorizationService::new(photo_repo.clone(), album_repo.clone(), share_repo.clone());
        let ingestion = IngestionService::new(
            photo_repo.clone(),
            storage.clone(),
            config.ingestion.clone(),
            config.storage.scratch_dir.clone(),
        );

        Self {
            sharing: SharingService::new(share_repo, photo_repo.clone(), user_repo.clone()),
            retrieval: MediaRetrievalService::new(authorization.clone(), storage.clone()),
            photos: PhotoService::new(
                photo_repo.clone(),
                authorization.clone(),
                ingestion.clone(),
                storage.clone(),
            ),
            albums: AlbumService::new(album_repo, photo_repo.clone(), authorization.clone()),
            comments: CommentService::new(comment_repo, authorization.clone()),
            users: UserAdminService::new(user_repo, photo_repo, storage),
            authorization,
            ingestion,
        }
    }
}
