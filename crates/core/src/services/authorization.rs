//! Authorization engine for photos and albums.
//!
//! Every decision is a pure function of a snapshot (caller, resource, grant)
//! evaluated as an ordered rule list, first match wins. The service loads the
//! snapshot from the database; any lookup failure degrades to a denial.

use photoshare_common::{AppError, AppResult};
use photoshare_db::{
    entities::{PermissionLevel, UserRole, album, photo, user},
    repositories::{AlbumRepository, PhotoRepository, ShareRepository},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An authenticated identity as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub role: UserRole,
    pub enabled: bool,
}

impl Caller {
    /// An enabled caller with the given role.
    #[must_use]
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            role,
            enabled: true,
        }
    }

    /// Whether this caller counts as authenticated. Disabled accounts do not.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.enabled
    }

    /// Whether this caller holds the ADMIN role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&user::Model> for Caller {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
            enabled: user.enabled,
        }
    }
}

/// A resource with exactly one owning user.
pub trait Owned {
    /// ID of the owning user.
    fn owner_id(&self) -> &str;
}

impl Owned for photo::Model {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Owned for album::Model {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// Identity comparison with the resource's owner reference.
#[must_use]
pub fn is_owner<R: Owned + ?Sized>(user: &Caller, resource: &R) -> bool {
    user.id == resource.owner_id()
}

/// Operations that can be requested on a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoAction {
    View,
    Edit,
    Delete,
    Comment,
}

/// Operations that can be requested on an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumAction {
    Access,
    Edit,
}

/// The four photo decisions for one caller, computed from a single snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPermissions {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_comment: bool,
}

/// Pure rule tables.
///
/// `grant` is the caller's share level on `photo`, if any; callers of these
/// functions are responsible for looking it up for the same (photo, caller) pair.
pub mod rules {
    use super::{AlbumAction, Caller, PhotoAction, is_owner};
    use photoshare_db::entities::{PermissionLevel, UserRole, album, photo};

    fn authenticated(caller: Option<&Caller>) -> Option<&Caller> {
        caller.filter(|c| c.is_active())
    }

    /// View: public, then admin, owner, any grant.
    #[must_use]
    pub fn can_view_photo(
        caller: Option<&Caller>,
        photo: Option<&photo::Model>,
        grant: Option<PermissionLevel>,
    ) -> bool {
        let Some(photo) = photo else {
            return false;
        };
        if photo.is_public() {
            return true;
        }
        let Some(caller) = authenticated(caller) else {
            return false;
        };
        if caller.role == UserRole::Admin {
            return true;
        }
        if is_owner(caller, photo) {
            return true;
        }
        grant.is_some()
    }

    /// Edit: owner or an ADMIN-level grant. The ADMIN role alone is not enough.
    #[must_use]
    pub fn can_edit_photo(
        caller: Option<&Caller>,
        photo: Option<&photo::Model>,
        grant: Option<PermissionLevel>,
    ) -> bool {
        let (Some(caller), Some(photo)) = (authenticated(caller), photo) else {
            return false;
        };
        if is_owner(caller, photo) {
            return true;
        }
        grant.is_some_and(|level| level.allows_edit())
    }

    /// Delete: admin, owner, or a moderator on a public or shared photo.
    #[must_use]
    pub fn can_delete_photo(
        caller: Option<&Caller>,
        photo: Option<&photo::Model>,
        grant: Option<PermissionLevel>,
    ) -> bool {
        let (Some(caller), Some(photo)) = (authenticated(caller), photo) else {
            return false;
        };
        if caller.role == UserRole::Admin {
            return true;
        }
        if is_owner(caller, photo) {
            return true;
        }
        caller.role == UserRole::Moderator && (photo.is_public() || grant.is_some())
    }

    /// Comment: admin or owner, or a COMMENT/ADMIN grant.
    #[must_use]
    pub fn can_comment_photo(
        caller: Option<&Caller>,
        photo: Option<&photo::Model>,
        grant: Option<PermissionLevel>,
    ) -> bool {
        let (Some(caller), Some(photo)) = (authenticated(caller), photo) else {
            return false;
        };
        if caller.role == UserRole::Admin || is_owner(caller, photo) {
            return true;
        }
        grant.is_some_and(|level| level.allows_comment())
    }

    /// Dispatch on the requested action.
    #[must_use]
    pub fn permits_photo(
        action: PhotoAction,
        caller: Option<&Caller>,
        photo: Option<&photo::Model>,
        grant: Option<PermissionLevel>,
    ) -> bool {
        match action {
            PhotoAction::View => can_view_photo(caller, photo, grant),
            PhotoAction::Edit => can_edit_photo(caller, photo, grant),
            PhotoAction::Delete => can_delete_photo(caller, photo, grant),
            PhotoAction::Comment => can_comment_photo(caller, photo, grant),
        }
    }

    /// Albums are never shared: admin or owner for both access and edit.
    #[must_use]
    pub fn permits_album(
        _action: AlbumAction,
        caller: Option<&Caller>,
        album: Option<&album::Model>,
    ) -> bool {
        let (Some(caller), Some(album)) = (authenticated(caller), album) else {
            return false;
        };
        caller.role == UserRole::Admin || is_owner(caller, album)
    }
}

/// Point-in-time facts a photo decision is made from.
#[derive(Debug, Clone, Default)]
struct PhotoSnapshot {
    photo: Option<photo::Model>,
    grant: Option<PermissionLevel>,
}

/// Authorization service: loads snapshots and applies [`rules`].
///
/// Read-only and lock-free. Two calls are not guaranteed to observe the same
/// state; callers re-check at the point of effect.
#[derive(Clone)]
pub struct AuthorizationService {
    photo_repo: PhotoRepository,
    album_repo: AlbumRepository,
    share_repo: ShareRepository,
}

impl AuthorizationService {
    /// Create a new authorization service.
    #[must_use]
    pub const fn new(
        photo_repo: PhotoRepository,
        album_repo: AlbumRepository,
        share_repo: ShareRepository,
    ) -> Self {
        Self {
            photo_repo,
            album_repo,
            share_repo,
        }
    }

    async fn photo_snapshot(&self, caller: Option<&Caller>, photo_id: &str) -> PhotoSnapshot {
        let photo = match self.photo_repo.find_by_id(photo_id).await {
            Ok(photo) => photo,
            Err(e) => {
                warn!(photo_id = %photo_id, error = %e, "Photo lookup failed, denying");
                return PhotoSnapshot::default();
            }
        };

        let grant = match (&photo, caller) {
            (Some(photo), Some(caller)) if caller.is_active() && !is_owner(caller, photo) => {
                self.get_permission_level(caller, photo).await
            }
            _ => None,
        };

        PhotoSnapshot { photo, grant }
    }

    /// The caller's share level on `photo`. Absence means no grant.
    pub async fn get_permission_level(
        &self,
        user: &Caller,
        photo: &photo::Model,
    ) -> Option<PermissionLevel> {
        match self
            .share_repo
            .find_by_photo_and_user(&photo.id, &user.id)
            .await
        {
            Ok(share) => share.map(|s| s.permission_level),
            Err(e) => {
                warn!(
                    photo_id = %photo.id,
                    user_id = %user.id,
                    error = %e,
                    "Share lookup failed, treating as no grant"
                );
                None
            }
        }
    }

    /// Whether `user` owns `resource`.
    #[must_use]
    pub fn is_owner<R: Owned + ?Sized>(&self, user: &Caller, resource: &R) -> bool {
        is_owner(user, resource)
    }

    /// Whether the caller may view the photo.
    pub async fn can_view_photo(&self, caller: Option<&Caller>, photo_id: &str) -> bool {
        self.check_photo(caller, photo_id, PhotoAction::View).await
    }

    /// Whether the caller may edit the photo's metadata.
    pub async fn can_edit_photo(&self, caller: Option<&Caller>, photo_id: &str) -> bool {
        self.check_photo(caller, photo_id, PhotoAction::Edit).await
    }

    /// Whether the caller may delete the photo.
    pub async fn can_delete_photo(&self, caller: Option<&Caller>, photo_id: &str) -> bool {
        self.check_photo(caller, photo_id, PhotoAction::Delete).await
    }

    /// Whether the caller may comment on the photo.
    pub async fn can_comment_photo(&self, caller: Option<&Caller>, photo_id: &str) -> bool {
        self.check_photo(caller, photo_id, PhotoAction::Comment).await
    }

    /// All four photo decisions from one snapshot.
    pub async fn photo_permissions(
        &self,
        caller: Option<&Caller>,
        photo_id: &str,
    ) -> PhotoPermissions {
        let snapshot = self.photo_snapshot(caller, photo_id).await;
        let photo = snapshot.photo.as_ref();
        PhotoPermissions {
            can_view: rules::can_view_photo(caller, photo, snapshot.grant),
            can_edit: rules::can_edit_photo(caller, photo, snapshot.grant),
            can_delete: rules::can_delete_photo(caller, photo, snapshot.grant),
            can_comment: rules::can_comment_photo(caller, photo, snapshot.grant),
        }
    }

    async fn check_photo(&self, caller: Option<&Caller>, photo_id: &str, action: PhotoAction) -> bool {
        let snapshot = self.photo_snapshot(caller, photo_id).await;
        let allowed = rules::permits_photo(action, caller, snapshot.photo.as_ref(), snapshot.grant);
        if !allowed {
            debug!(photo_id = %photo_id, ?action, "Photo access denied");
        }
        allowed
    }

    /// Load the photo if the caller may perform `action` on it.
    ///
    /// Missing photos and denials both yield the same [`AppError::Forbidden`].
    pub async fn require_photo(
        &self,
        caller: Option<&Caller>,
        photo_id: &str,
        action: PhotoAction,
    ) -> AppResult<photo::Model> {
        let snapshot = self.photo_snapshot(caller, photo_id).await;
        if rules::permits_photo(action, caller, snapshot.photo.as_ref(), snapshot.grant) {
            snapshot.photo.ok_or_else(AppError::access_denied)
        } else {
            debug!(photo_id = %photo_id, ?action, "Photo access denied");
            Err(AppError::access_denied())
        }
    }

    async fn load_album(&self, album_id: &str) -> Option<album::Model> {
        match self.album_repo.find_by_id(album_id).await {
            Ok(album) => album,
            Err(e) => {
                warn!(album_id = %album_id, error = %e, "Album lookup failed, denying");
                None
            }
        }
    }

    /// Whether the caller may see the album and its photos.
    pub async fn can_access_album(&self, caller: Option<&Caller>, album_id: &str) -> bool {
        let album = self.load_album(album_id).await;
        rules::permits_album(AlbumAction::Access, caller, album.as_ref())
    }

    /// Whether the caller may rename or delete the album.
    pub async fn can_edit_album(&self, caller: Option<&Caller>, album_id: &str) -> bool {
        let album = self.load_album(album_id).await;
        rules::permits_album(AlbumAction::Edit, caller, album.as_ref())
    }

    /// Load the album if the caller may perform `action` on it.
    pub async fn require_album(
        &self,
        caller: Option<&Caller>,
        album_id: &str,
        action: AlbumAction,
    ) -> AppResult<album::Model> {
        let album = self.load_album(album_id).await;
        if rules::permits_album(action, caller, album.as_ref()) {
            album.ok_or_else(AppError::access_denied)
        } else {
            debug!(album_id = %album_id, ?action, "Album access denied");
            Err(AppError::access_denied())
        }
    }
}
