//! Comments on photos.

use chrono::Utc;
use photoshare_common::{AppError, AppResult, IdGenerator};
use photoshare_db::{entities::comment, repositories::CommentRepository};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::authorization::{AuthorizationService, Caller, PhotoAction};

/// Maximum comments returned for one photo.
const MAX_COMMENTS: u64 = 500;

/// Input for adding a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

/// Comment service.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    authz: AuthorizationService,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, authz: AuthorizationService) -> Self {
        Self {
            comment_repo,
            authz,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a photo.
    pub async fn add_comment(
        &self,
        caller: Option<&Caller>,
        photo_id: &str,
        mut input: AddCommentInput,
    ) -> AppResult<comment::Model> {
        let photo = self
            .authz
            .require_photo(caller, photo_id, PhotoAction::Comment)
            .await?;

        input.text = input.text.trim().to_string();
        input.validate()?;

        // `require_photo` only succeeds for an authenticated caller.
        let author = caller.ok_or_else(AppError::access_denied)?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            photo_id: Set(photo.id),
            user_id: Set(author.id.clone()),
            text: Set(input.text),
            created_at: Set(Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        info!(comment_id = %comment.id, photo_id = %photo_id, "Comment added");
        Ok(comment)
    }

    /// Comments on a photo the caller may view, oldest first.
    pub async fn list_comments(
        &self,
        caller: Option<&Caller>,
        photo_id: &str,
    ) -> AppResult<Vec<comment::Model>> {
        self.authz
            .require_photo(caller, photo_id, PhotoAction::View)
            .await?;
        self.comment_repo.find_by_photo(photo_id, MAX_COMMENTS).await
    }

    /// Delete a comment. Allowed for its author, admins and moderators.
    pub async fn delete_comment(&self, caller: &Caller, comment_id: &str) -> AppResult<()> {
        if !caller.is_active() {
            return Err(AppError::Forbidden("Authentication required".to_string()));
        }

        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.user_id != caller.id && !caller.role.can_moderate() {
            return Err(AppError::Forbidden(
                "Only the author or a moderator can delete this comment".to_string(),
            ));
        }

        self.comment_repo.delete(comment_id).await?;
        info!(comment_id = %comment_id, deleted_by = %caller.id, "Comment deleted");
        Ok(())
    }
}
