//! Photo service: upload, metadata edits, deletion and listings.

use photoshare_common::{AppError, AppResult, StorageService};
use photoshare_db::{
    entities::{Visibility, photo},
    repositories::PhotoRepository,
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::authorization::{AuthorizationService, Caller, PhotoAction};
use super::ingestion::{IngestionService, UploadOutcome, UploadRequest};

/// Maximum page size for photo listings.
const MAX_LIST_LIMIT: u64 = 100;

/// Input for editing photo metadata. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhotoInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<Option<String>>,
    pub visibility: Option<Visibility>,
}

/// Photo service.
#[derive(Clone)]
pub struct PhotoService {
    photo_repo: PhotoRepository,
    authz: AuthorizationService,
    ingestion: IngestionService,
    storage: StorageService,
}

impl PhotoService {
    /// Create a new photo service.
    #[must_use]
    pub const fn new(
        photo_repo: PhotoRepository,
        authz: AuthorizationService,
        ingestion: IngestionService,
        storage: StorageService,
    ) -> Self {
        Self {
            photo_repo,
            authz,
            ingestion,
            storage,
        }
    }

    /// Upload a photo owned by the caller.
    pub async fn upload(
        &self,
        caller: Option<&Caller>,
        request: UploadRequest,
    ) -> AppResult<UploadOutcome> {
        self.ingestion.upload(caller, request).await
    }

    /// Get a photo the caller may view.
    ///
    /// A missing photo is reported as [`AppError::Forbidden`], same as a denial.
    pub async fn get_photo(&self, caller: Option<&Caller>, photo_id: &str) -> AppResult<photo::Model> {
        self.authz
            .require_photo(caller, photo_id, PhotoAction::View)
            .await
    }

    /// Edit title, description or visibility. Owner and creation time never change.
    pub async fn update_photo(
        &self,
        caller: Option<&Caller>,
        photo_id: &str,
        mut input: UpdatePhotoInput,
    ) -> AppResult<photo::Model> {
        if let Some(title) = input.title.as_mut() {
            *title = title.trim().to_string();
        }
        input.validate()?;

        let photo = self
            .authz
            .require_photo(caller, photo_id, PhotoAction::Edit)
            .await?;

        let mut active = photo.into_active_model();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(visibility) = input.visibility {
            active.visibility = Set(visibility);
        }

        let updated = self.photo_repo.update(active).await?;
        info!(photo_id = %photo_id, visibility = ?updated.visibility, "Photo updated");
        Ok(updated)
    }

    /// Delete a photo, its stored files and everything that references it.
    pub async fn delete_photo(&self, caller: Option<&Caller>, photo_id: &str) -> AppResult<()> {
        let photo = self
            .authz
            .require_photo(caller, photo_id, PhotoAction::Delete)
            .await?;

        remove_photo_files(&self.storage, &photo).await;

        if !self.photo_repo.delete(&photo.id).await? {
            return Err(AppError::NotFound(format!("Photo: {photo_id}")));
        }

        info!(
            photo_id = %photo_id,
            deleted_by = caller.map_or("", |c| c.id.as_str()),
            "Photo deleted"
        );
        Ok(())
    }

    /// Most recent public photos.
    pub async fn list_public(&self, limit: u64) -> AppResult<Vec<photo::Model>> {
        self.photo_repo
            .find_public(limit.clamp(1, MAX_LIST_LIMIT))
            .await
    }

    /// Browse feed: public photos, plus the caller's own and those shared with
    /// them. Anonymous or disabled callers get the public listing.
    pub async fn list_accessible(
        &self,
        caller: Option<&Caller>,
        limit: u64,
    ) -> AppResult<Vec<photo::Model>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        match caller.filter(|c| c.is_active()) {
            Some(caller) => self.photo_repo.find_accessible(&caller.id, limit).await,
            None => self.photo_repo.find_public(limit).await,
        }
    }

    /// The caller's own photos, newest first.
    pub async fn list_owned(&self, caller: &Caller, limit: u64) -> AppResult<Vec<photo::Model>> {
        if !caller.is_active() {
            return Err(AppError::Forbidden("Authentication required".to_string()));
        }
        self.photo_repo
            .find_by_user(&caller.id, limit.clamp(1, MAX_LIST_LIMIT))
            .await
    }
}

/// Remove a photo's original and distinct thumbnail, logging failures.
pub(crate) async fn remove_photo_files(storage: &StorageService, photo: &photo::Model) {
    let mut keys = vec![photo.storage_filename.as_str()];
    if photo.has_distinct_thumbnail()
        && let Some(thumbnail) = photo.thumbnail_filename.as_deref()
    {
        keys.push(thumbnail);
    }

    for key in keys {
        if let Err(e) = storage.delete(key).await {
            warn!(
                photo_id = %photo.id,
                key = %key,
                error = %e,
                "Failed to delete file from storage, proceeding with database deletion"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use photoshare_common::{IngestionConfig, LocalStorage};
    use photoshare_db::entities::{PermissionLevel, UserRole, share};
    use photoshare_db::repositories::{AlbumRepository, ShareRepository};
    use photoshare_db::test_utils::TestDatabase;
    use sea_orm::ActiveModelTrait;

    struct Fixture {
        db: TestDatabase,
        dir: tempfile::TempDir,
        service: PhotoService,
    }

    async fn fixture() -> Fixture {
        let db = TestDatabase::new().await.unwrap();
        db.insert_user("owner", UserRole::User).await.unwrap();
        db.insert_user("editor", UserRole::User).await.unwrap();
        db.insert_user("admin", UserRole::Admin).await.unwrap();
        db.insert_user("mod", UserRole::Moderator).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let conn = db.connection();
        let storage = LocalStorage::new(dir.path().to_path_buf()).into_service();
        let authz = AuthorizationService::new(
            PhotoRepository::new(conn.clone()),
            AlbumRepository::new(conn.clone()),
            ShareRepository::new(conn.clone()),
        );
        let ingestion = IngestionService::new(
            PhotoRepository::new(conn.clone()),
            storage.clone(),
            IngestionConfig::default(),
            dir.path().join("scratch"),
        );
        let service = PhotoService::new(PhotoRepository::new(conn), authz, ingestion, storage);
        Fixture { db, dir, service }
    }

    #[tokio::test]
    async fn test_update_photo_by_owner() {
        let f = fixture().await;
        let original = f
            .db
            .insert_photo("p1", "owner", Visibility::Private)
            .await
            .unwrap();
        let owner = Caller::new("owner", UserRole::User);

        let updated = f
            .service
            .update_photo(
                Some(&owner),
                "p1",
                UpdatePhotoInput {
                    title: Some("  Renamed ".to_string()),
                    description: Some(Some("At dusk".to_string())),
                    visibility: Some(Visibility::Public),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description.as_deref(), Some("At dusk"));
        assert_eq!(updated.visibility, Visibility::Public);
        assert_eq!(updated.user_id, original.user_id);
        assert_eq!(updated.created_at, original.created_at);
    }

    #[tokio::test]
    async fn test_update_photo_requires_edit() {
        let f = fixture().await;
        f.db.insert_photo("p1", "owner", Visibility::Public)
            .await
            .unwrap();

        let admin = Caller::new("admin", UserRole::Admin);
        let err = f
            .service
            .update_photo(Some(&admin), "p1", UpdatePhotoInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        share::ActiveModel {
            id: Set("s1".to_string()),
            photo_id: Set("p1".to_string()),
            user_id: Set("editor".to_string()),
            permission_level: Set(PermissionLevel::Admin),
            created_at: Set(Utc::now().into()),
        }
        .insert(f.db.conn.as_ref())
        .await
        .unwrap();

        let editor = Caller::new("editor", UserRole::User);
        let updated = f
            .service
            .update_photo(
                Some(&editor),
                "p1",
                UpdatePhotoInput {
                    title: Some("Edited".to_string()),
                    ..UpdatePhotoInput::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.user_id, "owner");
    }

    #[tokio::test]
    async fn test_update_photo_validates() {
        let f = fixture().await;
        f.db.insert_photo("p1", "owner", Visibility::Public)
            .await
            .unwrap();
        let owner = Caller::new("owner", UserRole::User);

        let err = f
            .service
            .update_photo(
                Some(&owner),
                "p1",
                UpdatePhotoInput {
                    title: Some(" ".to_string()),
                    ..UpdatePhotoInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_delete_photo_removes_files() {
        let f = fixture().await;
        f.db.insert_photo("p1", "owner", Visibility::Public)
            .await
            .unwrap();
        std::fs::write(f.dir.path().join("p1.jpg"), b"original").unwrap();
        std::fs::write(f.dir.path().join("thumb_p1.jpg"), b"thumb").unwrap();

        let moderator = Caller::new("mod", UserRole::Moderator);
        f.service.delete_photo(Some(&moderator), "p1").await.unwrap();

        assert!(!f.dir.path().join("p1.jpg").exists());
        assert!(!f.dir.path().join("thumb_p1.jpg").exists());
        assert!(matches!(
            f.service.get_photo(Some(&moderator), "p1").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_photo_denied() {
        let f = fixture().await;
        f.db.insert_photo("p1", "owner", Visibility::Private)
            .await
            .unwrap();

        let moderator = Caller::new("mod", UserRole::Moderator);
        assert!(matches!(
            f.service.delete_photo(Some(&moderator), "p1").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.delete_photo(None, "p1").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_listings() {
        let f = fixture().await;
        f.db.insert_photo("p1", "owner", Visibility::Public)
            .await
            .unwrap();
        f.db.insert_photo("p2", "owner", Visibility::Private)
            .await
            .unwrap();
        f.db.insert_photo("p3", "editor", Visibility::Private)
            .await
            .unwrap();

        let public = f.service.list_public(10).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id, "p1");

        let owner = Caller::new("owner", UserRole::User);
        let owned = f.service.list_owned(&owner, 10).await.unwrap();
        let mut ids: Vec<_> = owned.into_iter().map(|p| p.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_list_accessible() {
        let f = fixture().await;
        f.db.insert_photo("p1", "owner", Visibility::Public)
            .await
            .unwrap();
        f.db.insert_photo("p2", "owner", Visibility::Private)
            .await
            .unwrap();
        f.db.insert_photo("p3", "mod", Visibility::Private)
            .await
            .unwrap();
        f.db.insert_photo("p4", "mod", Visibility::Private)
            .await
            .unwrap();
        share::ActiveModel {
            id: Set("s1".to_string()),
            photo_id: Set("p3".to_string()),
            user_id: Set("editor".to_string()),
            permission_level: Set(PermissionLevel::Read),
            created_at: Set(Utc::now().into()),
        }
        .insert(f.db.conn.as_ref())
        .await
        .unwrap();

        let ids = |photos: Vec<photo::Model>| {
            let mut ids: Vec<_> = photos.into_iter().map(|p| p.id).collect();
            ids.sort();
            ids
        };

        let owner = Caller::new("owner", UserRole::User);
        let feed = f.service.list_accessible(Some(&owner), 10).await.unwrap();
        assert_eq!(ids(feed), vec!["p1", "p2"]);

        let editor = Caller::new("editor", UserRole::User);
        let feed = f.service.list_accessible(Some(&editor), 10).await.unwrap();
        assert_eq!(ids(feed), vec!["p1", "p3"]);

        let feed = f.service.list_accessible(None, 10).await.unwrap();
        assert_eq!(ids(feed), vec!["p1"]);

        let mut disabled = Caller::new("owner", UserRole::User);
        disabled.enabled = false;
        let feed = f.service.list_accessible(Some(&disabled), 10).await.unwrap();
        assert_eq!(ids(feed), vec!["p1"]);
    }
}
