//! Share repository.

use std::sync::Arc;

use crate::entities::{PermissionLevel, Share, share};
use photoshare_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

/// Share repository for database operations.
#[derive(Clone)]
pub struct ShareRepository {
    db: Arc<DatabaseConnection>,
}

impl ShareRepository {
    /// Create a new share repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a share by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<share::Model>> {
        Share::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a share by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<share::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Share: {id}")))
    }

    /// Find the grant for a (photo, user) pair.
    pub async fn find_by_photo_and_user(
        &self,
        photo_id: &str,
        user_id: &str,
    ) -> AppResult<Option<share::Model>> {
        Share::find()
            .filter(share::Column::PhotoId.eq(photo_id))
            .filter(share::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All grants on a photo, oldest first.
    pub async fn find_by_photo(&self, photo_id: &str) -> AppResult<Vec<share::Model>> {
        Share::find()
            .filter(share::Column::PhotoId.eq(photo_id))
            .order_by_asc(share::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a share.
    ///
    /// The `(photo_id, user_id)` unique index is authoritative: a concurrent
    /// duplicate insert surfaces as [`AppError::Conflict`].
    pub async fn create(&self, model: share::ActiveModel) -> AppResult<share::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("Photo is already shared with this user".to_string())
            }
            other => other,
        })
    }

    /// Overwrite the permission level of a share.
    pub async fn update_level(
        &self,
        share: share::Model,
        level: PermissionLevel,
    ) -> AppResult<share::Model> {
        let mut model = share.into_active_model();
        model.permission_level = Set(level);
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a share.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Share::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}
