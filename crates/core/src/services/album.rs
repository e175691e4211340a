//! Album service. Albums are private to their owner (and admins); they are
//! never shared.

use chrono::Utc;
use photoshare_common::{AppError, AppResult, IdGenerator};
use photoshare_db::{
    entities::{album, album_photo, photo},
    repositories::{AlbumRepository, PhotoRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::authorization::{AlbumAction, AuthorizationService, Caller, PhotoAction, is_owner};

/// Input for creating an album.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbumInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

/// Input for updating an album.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlbumInput {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(max = 2048))]
    pub description: Option<Option<String>>,
}

/// Service for managing albums and their photos.
#[derive(Clone)]
pub struct AlbumService {
    album_repo: AlbumRepository,
    photo_repo: PhotoRepository,
    authz: AuthorizationService,
    id_gen: IdGenerator,
}

impl AlbumService {
    /// Create a new album service.
    #[must_use]
    pub const fn new(
        album_repo: AlbumRepository,
        photo_repo: PhotoRepository,
        authz: AuthorizationService,
    ) -> Self {
        Self {
            album_repo,
            photo_repo,
            authz,
            id_gen: IdGenerator::new(),
        }
    }

    fn require_active(caller: &Caller) -> AppResult<()> {
        if caller.is_active() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Authentication required".to_string()))
        }
    }

    /// Create an album owned by the caller.
    pub async fn create_album(
        &self,
        caller: &Caller,
        mut input: CreateAlbumInput,
    ) -> AppResult<album::Model> {
        Self::require_active(caller)?;
        input.name = input.name.trim().to_string();
        input.validate()?;

        let model = album::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(caller.id.clone()),
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let album = self.album_repo.create(model).await?;
        info!(album_id = %album.id, user_id = %caller.id, "Album created");
        Ok(album)
    }

    /// Get an album the caller may access.
    pub async fn get_album(&self, caller: Option<&Caller>, album_id: &str) -> AppResult<album::Model> {
        self.authz
            .require_album(caller, album_id, AlbumAction::Access)
            .await
    }

    /// Update an album's name or description.
    pub async fn update_album(
        &self,
        caller: Option<&Caller>,
        album_id: &str,
        mut input: UpdateAlbumInput,
    ) -> AppResult<album::Model> {
        if let Some(name) = input.name.as_mut() {
            *name = name.trim().to_string();
        }
        input.validate()?;

        let album = self
            .authz
            .require_album(caller, album_id, AlbumAction::Edit)
            .await?;

        let mut active = album.into_active_model();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.album_repo.update(active).await
    }

    /// Rename an album.
    pub async fn rename_album(
        &self,
        caller: Option<&Caller>,
        album_id: &str,
        name: &str,
    ) -> AppResult<album::Model> {
        self.update_album(
            caller,
            album_id,
            UpdateAlbumInput {
                name: Some(name.to_string()),
                description: None,
            },
        )
        .await
    }

    /// Delete an album. Its photos are untouched.
    pub async fn delete_album(&self, caller: Option<&Caller>, album_id: &str) -> AppResult<()> {
        self.authz
            .require_album(caller, album_id, AlbumAction::Edit)
            .await?;

        if !self.album_repo.delete(album_id).await? {
            return Err(AppError::NotFound(format!("Album: {album_id}")));
        }
        info!(album_id = %album_id, "Album deleted");
        Ok(())
    }

    /// Photos in an album the caller may access.
    pub async fn list_photos(
        &self,
        caller: Option<&Caller>,
        album_id: &str,
    ) -> AppResult<Vec<photo::Model>> {
        self.authz
            .require_album(caller, album_id, AlbumAction::Access)
            .await?;
        self.photo_repo.find_in_album(album_id).await
    }

    /// Albums owned by the caller.
    pub async fn list_albums(&self, caller: &Caller) -> AppResult<Vec<album::Model>> {
        Self::require_active(caller)?;
        self.album_repo.find_by_user(&caller.id).await
    }

    /// The caller's albums that already hold a photo the caller can view.
    pub async fn albums_containing_photo(
        &self,
        caller: &Caller,
        photo_id: &str,
    ) -> AppResult<Vec<album::Model>> {
        Self::require_active(caller)?;
        self.authz
            .require_photo(Some(caller), photo_id, PhotoAction::View)
            .await?;
        self.album_repo
            .find_by_user_containing(&caller.id, photo_id)
            .await
    }

    /// The caller's albums a photo could still be added to.
    pub async fn albums_without_photo(
        &self,
        caller: &Caller,
        photo_id: &str,
    ) -> AppResult<Vec<album::Model>> {
        Self::require_active(caller)?;
        self.authz
            .require_photo(Some(caller), photo_id, PhotoAction::View)
            .await?;
        self.album_repo
            .find_by_user_without(&caller.id, photo_id)
            .await
    }

    /// Load both sides of a membership change, requiring the caller to own both.
    async fn owned_pair(
        &self,
        caller: &Caller,
        album_id: &str,
        photo_id: &str,
    ) -> AppResult<(album::Model, photo::Model)> {
        Self::require_active(caller)?;
        let album = self.album_repo.find_by_id(album_id).await?;
        let photo = self.photo_repo.find_by_id(photo_id).await?;

        match (album, photo) {
            (Some(album), Some(photo)) if is_owner(caller, &album) && is_owner(caller, &photo) => {
                Ok((album, photo))
            }
            _ => Err(AppError::Forbidden(
                "You must own both the album and the photo".to_string(),
            )),
        }
    }

    /// Add one of the caller's photos to one of the caller's albums.
    pub async fn add_photo(
        &self,
        caller: &Caller,
        album_id: &str,
        photo_id: &str,
    ) -> AppResult<album_photo::Model> {
        let (album, photo) = self.owned_pair(caller, album_id, photo_id).await?;

        if self.album_repo.contains_photo(&album.id, &photo.id).await? {
            return Err(AppError::Conflict(
                "Photo is already in this album".to_string(),
            ));
        }

        let model = album_photo::ActiveModel {
            id: Set(self.id_gen.generate()),
            album_id: Set(album.id),
            photo_id: Set(photo.id),
            created_at: Set(Utc::now().into()),
        };
        self.album_repo.add_photo(model).await
    }

    /// Remove a photo from an album.
    pub async fn remove_photo(&self, caller: &Caller, album_id: &str, photo_id: &str) -> AppResult<()> {
        self.owned_pair(caller, album_id, photo_id).await?;

        if !self.album_repo.remove_photo(album_id, photo_id).await? {
            return Err(AppError::NotFound(
                "Photo is not in this album".to_string(),
            ));
        }
        Ok(())
    }
}
