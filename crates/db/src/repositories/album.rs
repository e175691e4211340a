//! Album repository, including photo membership.

use std::sync::Arc;

use crate::entities::{Album, AlbumPhoto, album, album_photo};
use photoshare_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, sea_query::Query,
};

/// Album repository for database operations.
#[derive(Clone)]
pub struct AlbumRepository {
    db: Arc<DatabaseConnection>,
}

impl AlbumRepository {
    /// Create a new album repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an album by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<album::Model>> {
        Album::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an album by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<album::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album: {id}")))
    }

    /// Albums owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<album::Model>> {
        Album::find()
            .filter(album::Column::UserId.eq(user_id))
            .order_by_desc(album::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Albums of `user_id` that contain `photo_id`, newest first.
    pub async fn find_by_user_containing(
        &self,
        user_id: &str,
        photo_id: &str,
    ) -> AppResult<Vec<album::Model>> {
        self.find_by_user_membership(user_id, photo_id, true).await
    }

    /// Albums of `user_id` that do not contain `photo_id`, newest first.
    pub async fn find_by_user_without(
        &self,
        user_id: &str,
        photo_id: &str,
    ) -> AppResult<Vec<album::Model>> {
        self.find_by_user_membership(user_id, photo_id, false).await
    }

    async fn find_by_user_membership(
        &self,
        user_id: &str,
        photo_id: &str,
        contains: bool,
    ) -> AppResult<Vec<album::Model>> {
        let holding = Query::select()
            .column(album_photo::Column::AlbumId)
            .from(AlbumPhoto)
            .and_where(album_photo::Column::PhotoId.eq(photo_id))
            .to_owned();
        let membership = if contains {
            album::Column::Id.in_subquery(holding)
        } else {
            album::Column::Id.not_in_subquery(holding)
        };

        Album::find()
            .filter(album::Column::UserId.eq(user_id))
            .filter(membership)
            .order_by_desc(album::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new album.
    pub async fn create(&self, model: album::ActiveModel) -> AppResult<album::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an album.
    pub async fn update(&self, model: album::ActiveModel) -> AppResult<album::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an album. Memberships cascade; photos are untouched.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Album::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    // ========== Membership ==========

    /// Add a photo to an album. A repeated membership is a [`AppError::Conflict`].
    pub async fn add_photo(&self, model: album_photo::ActiveModel) -> AppResult<album_photo::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Photo is already in this album".to_string()),
            other => other,
        })
    }

    /// Remove a photo from an album. Returns whether a membership existed.
    pub async fn remove_photo(&self, album_id: &str, photo_id: &str) -> AppResult<bool> {
        let result = AlbumPhoto::delete_many()
            .filter(album_photo::Column::AlbumId.eq(album_id))
            .filter(album_photo::Column::PhotoId.eq(photo_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Whether a photo is in an album.
    pub async fn contains_photo(&self, album_id: &str, photo_id: &str) -> AppResult<bool> {
        let count = AlbumPhoto::find()
            .filter(album_photo::Column::AlbumId.eq(album_id))
            .filter(album_photo::Column::PhotoId.eq(photo_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }
}
