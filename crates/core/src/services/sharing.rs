//! Sharing ledger: per-(photo, user) permission grants.
//!
//! Only a photo's owner may create, change, list or revoke its shares. There is
//! no delegation; an ADMIN-level grantee cannot re-share.

use chrono::Utc;
use photoshare_common::{AppError, AppResult, IdGenerator};
use photoshare_db::{
    entities::{PermissionLevel, photo, share},
    repositories::{PhotoRepository, ShareRepository, UserRepository},
};
use sea_orm::Set;
use tracing::info;

use super::authorization::{Caller, is_owner};

/// Upper bound for the "shared with me" listing.
const SHARED_WITH_LIMIT: u64 = 1000;

/// Sharing service for managing photo grants.
#[derive(Clone)]
pub struct SharingService {
    share_repo: ShareRepository,
    photo_repo: PhotoRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl SharingService {
    /// Create a new sharing service.
    #[must_use]
    pub const fn new(
        share_repo: ShareRepository,
        photo_repo: PhotoRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            share_repo,
            photo_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Load `photo_id` and verify the requester owns it.
    ///
    /// A missing photo is denied the same way as a foreign one.
    async fn owned_photo(&self, photo_id: &str, requester: &Caller) -> AppResult<photo::Model> {
        match self.photo_repo.find_by_id(photo_id).await? {
            Some(photo) if requester.is_active() && is_owner(requester, &photo) => Ok(photo),
            _ => Err(AppError::access_denied()),
        }
    }

    /// Load a share and verify the requester owns its photo.
    async fn owned_share(&self, share_id: &str, requester: &Caller) -> AppResult<share::Model> {
        let Some(share) = self.share_repo.find_by_id(share_id).await? else {
            return Err(AppError::access_denied());
        };
        self.owned_photo(&share.photo_id, requester).await?;
        Ok(share)
    }

    /// Grant `grantee_id` access to a photo.
    pub async fn create_share(
        &self,
        photo_id: &str,
        grantee_id: &str,
        level: PermissionLevel,
        requester: &Caller,
    ) -> AppResult<share::Model> {
        let photo = self.owned_photo(photo_id, requester).await?;

        if grantee_id == photo.user_id {
            return Err(AppError::InvalidArgument(
                "Cannot share a photo with its owner".to_string(),
            ));
        }

        self.user_repo.get_by_id(grantee_id).await?;

        if self
            .share_repo
            .find_by_photo_and_user(photo_id, grantee_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Photo is already shared with this user".to_string(),
            ));
        }

        let model = share::ActiveModel {
            id: Set(self.id_gen.generate()),
            photo_id: Set(photo_id.to_string()),
            user_id: Set(grantee_id.to_string()),
            permission_level: Set(level),
            created_at: Set(Utc::now().into()),
        };

        // Concurrent duplicates lose on the unique index and surface as Conflict.
        let share = self.share_repo.create(model).await?;

        info!(
            share_id = %share.id,
            photo_id = %photo_id,
            grantee_id = %grantee_id,
            ?level,
            "Photo shared"
        );

        Ok(share)
    }

    /// Overwrite the level of an existing share.
    pub async fn update_permission(
        &self,
        share_id: &str,
        level: PermissionLevel,
        requester: &Caller,
    ) -> AppResult<share::Model> {
        let share = self.owned_share(share_id, requester).await?;
        let updated = self.share_repo.update_level(share, level).await?;

        info!(share_id = %share_id, ?level, "Share permission updated");
        Ok(updated)
    }

    /// Revoke a share.
    pub async fn revoke(&self, share_id: &str, requester: &Caller) -> AppResult<()> {
        self.owned_share(share_id, requester).await?;
        if !self.share_repo.delete(share_id).await? {
            return Err(AppError::NotFound(format!("Share: {share_id}")));
        }

        info!(share_id = %share_id, "Share revoked");
        Ok(())
    }

    /// All shares of a photo.
    pub async fn list_shares_for_photo(
        &self,
        photo_id: &str,
        requester: &Caller,
    ) -> AppResult<Vec<share::Model>> {
        self.owned_photo(photo_id, requester).await?;
        self.share_repo.find_by_photo(photo_id).await
    }

    /// Photos other users have shared with the requester.
    pub async fn list_shared_with(&self, requester: &Caller) -> AppResult<Vec<photo::Model>> {
        if !requester.is_active() {
            return Err(AppError::Forbidden("Authentication required".to_string()));
        }
        self.photo_repo
            .find_shared_with(&requester.id, SHARED_WITH_LIMIT)
            .await
    }
}
