//! Photo repository.

use std::sync::Arc;

use crate::entities::{Photo, Visibility, album_photo, photo, share};
use photoshare_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
    sea_query::{JoinType, Query},
};

/// Photo repository for database operations.
#[derive(Clone)]
pub struct PhotoRepository {
    db: Arc<DatabaseConnection>,
}

impl PhotoRepository {
    /// Create a new photo repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a photo by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<photo::Model>> {
        Photo::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a photo by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<photo::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo: {id}")))
    }

    /// Find a photo by its generated storage name.
    pub async fn find_by_storage_filename(
        &self,
        storage_filename: &str,
    ) -> AppResult<Option<photo::Model>> {
        Photo::find()
            .filter(photo::Column::StorageFilename.eq(storage_filename))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new photo.
    pub async fn create(&self, model: photo::ActiveModel) -> AppResult<photo::Model> {
        model.insert(self.db.as_ref()).await.map_err(AppError::from)
    }

    /// Update a photo.
    pub async fn update(&self, model: photo::ActiveModel) -> AppResult<photo::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a photo. Shares, comments and album memberships cascade.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Photo::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Photos owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str, limit: u64) -> AppResult<Vec<photo::Model>> {
        Photo::find()
            .filter(photo::Column::UserId.eq(user_id))
            .order_by_desc(photo::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All photos owned by a user (used when removing the user's files).
    pub async fn find_all_by_user(&self, user_id: &str) -> AppResult<Vec<photo::Model>> {
        Photo::find()
            .filter(photo::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Public photos, newest first.
    pub async fn find_public(&self, limit: u64) -> AppResult<Vec<photo::Model>> {
        Photo::find()
            .filter(photo::Column::Visibility.eq(Visibility::Public))
            .order_by_desc(photo::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Photos on which `user_id` holds a share, newest first.
    pub async fn find_shared_with(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<photo::Model>> {
        Photo::find()
            .join(JoinType::InnerJoin, photo::Relation::Shares.def())
            .filter(share::Column::UserId.eq(user_id))
            .order_by_desc(photo::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Photos `user_id` can browse: public ones, their own, and those shared
    /// with them. Newest first.
    pub async fn find_accessible(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<photo::Model>> {
        let shared_with = Query::select()
            .column(share::Column::PhotoId)
            .from(share::Entity)
            .and_where(share::Column::UserId.eq(user_id))
            .to_owned();

        Photo::find()
            .filter(
                Condition::any()
                    .add(photo::Column::Visibility.eq(Visibility::Public))
                    .add(photo::Column::UserId.eq(user_id))
                    .add(photo::Column::Id.in_subquery(shared_with)),
            )
            .order_by_desc(photo::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Photos that are members of an album.
    pub async fn find_in_album(&self, album_id: &str) -> AppResult<Vec<photo::Model>> {
        Photo::find()
            .join(JoinType::InnerJoin, photo::Relation::AlbumPhotos.def())
            .filter(album_photo::Column::AlbumId.eq(album_id))
            .order_by_desc(photo::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
