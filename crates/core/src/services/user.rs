//! User administration: registration, enablement, roles and account removal.

use chrono::Utc;
use photoshare_common::{AppError, AppResult, IdGenerator, StorageService};
use photoshare_db::{
    entities::{UserRole, user},
    repositories::{PhotoRepository, UserRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::authorization::Caller;
use super::photo::remove_photo_files;

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserInput {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
}

/// User administration service.
#[derive(Clone)]
pub struct UserAdminService {
    user_repo: UserRepository,
    photo_repo: PhotoRepository,
    storage: StorageService,
    id_gen: IdGenerator,
}

impl UserAdminService {
    /// Create a new user administration service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        photo_repo: PhotoRepository,
        storage: StorageService,
    ) -> Self {
        Self {
            user_repo,
            photo_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    fn require_admin(actor: &Caller) -> AppResult<()> {
        if actor.is_active() && actor.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Register a new, enabled user with the USER role.
    pub async fn register(&self, mut input: RegisterUserInput) -> AppResult<user::Model> {
        input.username = input.username.trim().to_string();
        input.validate()?;
        if !is_valid_username(&input.username) {
            return Err(AppError::InvalidArgument(
                "Username may only contain letters, digits and underscores".to_string(),
            ));
        }

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            role: Set(UserRole::User),
            enabled: Set(true),
            created_at: Set(Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Build the caller identity for an existing user.
    pub async fn caller_for(&self, user_id: &str) -> AppResult<Caller> {
        let user = self.user_repo.get_by_id(user_id).await?;
        Ok(Caller::from(&user))
    }

    /// Enable or disable an account.
    pub async fn set_enabled(
        &self,
        actor: &Caller,
        target_id: &str,
        enabled: bool,
    ) -> AppResult<user::Model> {
        Self::require_admin(actor)?;
        if !enabled && actor.id == target_id {
            return Err(AppError::InvalidArgument(
                "Cannot disable your own account".to_string(),
            ));
        }

        let target = self.user_repo.get_by_id(target_id).await?;
        let mut active = target.into_active_model();
        active.enabled = Set(enabled);
        let updated = self.user_repo.update(active).await?;

        info!(user_id = %target_id, enabled, by = %actor.id, "User enablement changed");
        Ok(updated)
    }

    /// Change a user's role between USER and MODERATOR.
    ///
    /// No one can be promoted to ADMIN, and existing admins cannot be changed.
    pub async fn change_role(
        &self,
        actor: &Caller,
        target_id: &str,
        role: UserRole,
    ) -> AppResult<user::Model> {
        Self::require_admin(actor)?;
        if role == UserRole::Admin {
            return Err(AppError::InvalidArgument(
                "The ADMIN role cannot be assigned".to_string(),
            ));
        }

        let target = self.user_repo.get_by_id(target_id).await?;
        if target.role == UserRole::Admin {
            return Err(AppError::Forbidden(
                "An administrator's role cannot be changed".to_string(),
            ));
        }

        let mut active = target.into_active_model();
        active.role = Set(role);
        let updated = self.user_repo.update(active).await?;

        info!(user_id = %target_id, ?role, by = %actor.id, "User role changed");
        Ok(updated)
    }

    /// Delete an account with its stored files. Rows cascade in the database.
    pub async fn delete_user(&self, actor: &Caller, target_id: &str) -> AppResult<()> {
        if !actor.is_active() || (actor.id != target_id && !actor.is_admin()) {
            return Err(AppError::Forbidden(
                "Only the user or an admin can delete this account".to_string(),
            ));
        }

        self.user_repo.get_by_id(target_id).await?;

        let photos = self.photo_repo.find_all_by_user(target_id).await?;
        for photo in &photos {
            remove_photo_files(&self.storage, photo).await;
        }

        self.user_repo.delete(target_id).await?;
        info!(user_id = %target_id, photos = photos.len(), by = %actor.id, "User deleted");
        Ok(())
    }

    /// List users, oldest first. Admin only.
    pub async fn list_users(
        &self,
        actor: &Caller,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        Self::require_admin(actor)?;
        self.user_repo.find_all(limit.clamp(1, 100), offset).await
    }
}

/// Usernames are ASCII letters, digits and underscores.
fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use photoshare_common::LocalStorage;
    use photoshare_db::entities::Visibility;
    use photoshare_db::test_utils::TestDatabase;

    async fn setup() -> (TestDatabase, tempfile::TempDir, UserAdminService) {
        let db = TestDatabase::new().await.unwrap();
        db.insert_user("admin", UserRole::Admin).await.unwrap();
        db.insert_user("alice", UserRole::User).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let conn = db.connection();
        let service = UserAdminService::new(
            UserRepository::new(conn.clone()),
            PhotoRepository::new(conn),
            LocalStorage::new(dir.path().to_path_buf()).into_service(),
        );
        (db, dir, service)
    }

    fn register(name: &str) -> RegisterUserInput {
        RegisterUserInput {
            username: name.to_string(),
        }
    }

    #[test]
    fn test_username_charset() {
        assert!(is_valid_username("bob_42"));
        assert!(!is_valid_username("bob smith"));
        assert!(!is_valid_username("bøb"));
        assert!(!is_valid_username("bob-1"));
    }

    #[tokio::test]
    async fn test_register() {
        let (_db, _dir, service) = setup().await;

        let user = service.register(register("carol")).await.unwrap();
        assert_eq!(user.role, UserRole::User);
        assert!(user.enabled);

        assert!(matches!(
            service.register(register("carol")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.register(register("ab")).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.register(register("no spaces")).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_role_changes() {
        let (_db, _dir, service) = setup().await;
        let admin = service.caller_for("admin").await.unwrap();
        let alice = service.caller_for("alice").await.unwrap();

        let promoted = service
            .change_role(&admin, "alice", UserRole::Moderator)
            .await
            .unwrap();
        assert_eq!(promoted.role, UserRole::Moderator);

        assert!(matches!(
            service.change_role(&admin, "alice", UserRole::Admin).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.change_role(&admin, "admin", UserRole::User).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.change_role(&alice, "alice", UserRole::Moderator).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_set_enabled() {
        let (_db, _dir, service) = setup().await;
        let admin = service.caller_for("admin").await.unwrap();

        let disabled = service.set_enabled(&admin, "alice", false).await.unwrap();
        assert!(!disabled.enabled);
        assert!(!service.caller_for("alice").await.unwrap().is_active());

        assert!(matches!(
            service.set_enabled(&admin, "admin", false).await,
            Err(AppError::InvalidArgument(_))
        ));

        let alice = service.caller_for("alice").await.unwrap();
        assert!(matches!(
            service.set_enabled(&alice, "alice", true).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_user_removes_files() {
        let (db, dir, service) = setup().await;
        db.insert_photo("p1", "alice", Visibility::Public)
            .await
            .unwrap();
        std::fs::write(dir.path().join("p1.jpg"), b"original").unwrap();
        std::fs::write(dir.path().join("thumb_p1.jpg"), b"thumb").unwrap();

        db.insert_user("bob", UserRole::User).await.unwrap();
        let bob = service.caller_for("bob").await.unwrap();
        assert!(matches!(
            service.delete_user(&bob, "alice").await,
            Err(AppError::Forbidden(_))
        ));

        let alice = service.caller_for("alice").await.unwrap();
        service.delete_user(&alice, "alice").await.unwrap();

        assert!(!dir.path().join("p1.jpg").exists());
        assert!(!dir.path().join("thumb_p1.jpg").exists());
        assert!(matches!(
            service.caller_for("alice").await,
            Err(AppError::NotFound(_))
        ));
    }
}
