//! End-to-end scenarios across ingestion, sharing, authorization and retrieval.

#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use photoshare_common::{
    AppError, Config, DatabaseConfig, IngestionConfig, LoggingConfig, StorageConfig,
};
use photoshare_core::{Caller, Services, ThumbnailStatus, UpdatePhotoInput, UploadRequest};
use photoshare_db::entities::{PermissionLevel, UserRole, Visibility};
use photoshare_db::test_utils::TestDatabase;
use tempfile::TempDir;

struct Harness {
    db: TestDatabase,
    _dir: TempDir,
    services: Services,
}

async fn harness() -> Harness {
    photoshare_common::telemetry::init_for_tests();

    let db = TestDatabase::new().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        storage: StorageConfig {
            upload_root: dir.path().join("uploads"),
            scratch_dir: dir.path().join("scratch"),
        },
        ingestion: IngestionConfig::default(),
        logging: LoggingConfig::default(),
    };
    let services = Services::from_config(db.connection(), &config);
    Harness {
        db,
        _dir: dir,
        services,
    }
}

async fn register(h: &Harness, username: &str) -> Caller {
    let user = h
        .services
        .users
        .register(photoshare_core::RegisterUserInput {
            username: username.to_string(),
        })
        .await
        .unwrap();
    Caller::from(&user)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 90]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn upload_request(data: Vec<u8>, filename: &str, visibility: Visibility) -> UploadRequest {
    UploadRequest {
        data,
        original_filename: filename.to_string(),
        content_type: "image/png".to_string(),
        title: "Harbour at noon".to_string(),
        description: Some("Taken from the pier".to_string()),
        visibility,
    }
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn test_share_then_revoke() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let bob = register(&h, "bob").await;
    let data = jpeg(640, 480);

    let mut request = upload_request(data.clone(), "photo.jpg", Visibility::Private);
    request.content_type = "image/jpeg".to_string();
    let photo = h
        .services
        .photos
        .upload(Some(&alice), request)
        .await
        .unwrap()
        .photo;

    let authz = &h.services.authorization;
    assert!(!authz.can_view_photo(Some(&bob), &photo.id).await);
    assert!(matches!(
        h.services.retrieval.get_original_bytes(&photo.id, Some(&bob)).await,
        Err(AppError::Forbidden(_))
    ));

    let share = h
        .services
        .sharing
        .create_share(&photo.id, &bob.id, PermissionLevel::Comment, &alice)
        .await
        .unwrap();

    assert!(authz.can_view_photo(Some(&bob), &photo.id).await);
    assert!(authz.can_comment_photo(Some(&bob), &photo.id).await);
    assert!(!authz.can_edit_photo(Some(&bob), &photo.id).await);
    let bytes = h
        .services
        .retrieval
        .get_original_bytes(&photo.id, Some(&bob))
        .await
        .unwrap();
    assert_eq!(bytes.data, data);
    assert_eq!(bytes.content_type, "image/jpeg");

    let comment = h
        .services
        .comments
        .add_comment(
            Some(&bob),
            &photo.id,
            photoshare_core::AddCommentInput {
                text: "Great colours".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(comment.user_id, bob.id);

    let shared = h.services.sharing.list_shared_with(&bob).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].id, photo.id);

    h.services
        .sharing
        .update_permission(&share.id, PermissionLevel::Read, &alice)
        .await
        .unwrap();
    assert!(authz.can_view_photo(Some(&bob), &photo.id).await);
    assert!(!authz.can_comment_photo(Some(&bob), &photo.id).await);

    h.services.sharing.revoke(&share.id, &alice).await.unwrap();
    assert!(!authz.can_view_photo(Some(&bob), &photo.id).await);
    assert!(matches!(
        h.services.retrieval.get_thumbnail_bytes(&photo.id, Some(&bob)).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_public_photo_visible_to_anonymous() {
    let h = harness().await;
    let alice = register(&h, "alice").await;

    let photo = h
        .services
        .photos
        .upload(Some(&alice), upload_request(png(50, 50), "square.png", Visibility::Public))
        .await
        .unwrap()
        .photo;

    assert!(h.services.authorization.can_view_photo(None, &photo.id).await);
    assert!(!h.services.authorization.can_comment_photo(None, &photo.id).await);
    assert!(h.services.retrieval.get_thumbnail_bytes(&photo.id, None).await.is_ok());
    assert_eq!(h.services.photos.list_public(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_identical_filenames_get_distinct_storage() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let first_bytes = png(30, 20);
    let second_bytes = png(20, 30);

    let first = h
        .services
        .photos
        .upload(Some(&alice), upload_request(first_bytes.clone(), "IMG_0001.PNG", Visibility::Private))
        .await
        .unwrap()
        .photo;
    let second = h
        .services
        .photos
        .upload(Some(&alice), upload_request(second_bytes.clone(), "IMG_0001.PNG", Visibility::Private))
        .await
        .unwrap()
        .photo;

    assert_ne!(first.storage_filename, second.storage_filename);
    assert_eq!(first.original_filename, second.original_filename);
    assert!(first.storage_filename.ends_with(".png"));

    let retrieval = &h.services.retrieval;
    assert_eq!(
        retrieval.get_original_bytes(&first.id, Some(&alice)).await.unwrap().data,
        first_bytes
    );
    assert_eq!(
        retrieval.get_original_bytes(&second.id, Some(&alice)).await.unwrap().data,
        second_bytes
    );
}

#[tokio::test]
async fn test_thumbnail_preserves_aspect_ratio() {
    let h = harness().await;
    let alice = register(&h, "alice").await;

    let outcome = h
        .services
        .photos
        .upload(Some(&alice), upload_request(png(1000, 333), "pano.png", Visibility::Private))
        .await
        .unwrap();
    assert!(outcome.thumbnail.is_generated());

    let thumb = h
        .services
        .retrieval
        .get_thumbnail_bytes(&outcome.photo.id, Some(&alice))
        .await
        .unwrap();
    assert_eq!(thumb.content_type, "image/jpeg");

    let (width, height) = image::load_from_memory(&thumb.data).unwrap().dimensions();
    assert_eq!(width, 300);
    let expected = 333.0 * 300.0 / 1000.0;
    assert!((f64::from(height) - expected).abs() <= 1.0);
}

#[tokio::test]
async fn test_spoofed_jpeg_rejected() {
    let h = harness().await;
    let alice = register(&h, "alice").await;

    let mut request = upload_request(b"#!/bin/sh\necho pwned\n".to_vec(), "cat.jpg", Visibility::Public);
    request.content_type = "image/jpeg".to_string();

    assert!(matches!(
        h.services.photos.upload(Some(&alice), request).await,
        Err(AppError::UnsupportedMediaType(_))
    ));
    assert!(h.services.photos.list_owned(&alice, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_undecodable_upload_serves_original_as_thumbnail() {
    let h = harness().await;
    let alice = register(&h, "alice").await;

    // A valid PNG signature followed by garbage sniffs as PNG but cannot decode.
    let mut data = png(40, 40);
    data.truncate(16);
    data.extend_from_slice(&[0xAB; 64]);

    let outcome = h
        .services
        .photos
        .upload(Some(&alice), upload_request(data.clone(), "broken.png", Visibility::Private))
        .await
        .unwrap();
    assert!(matches!(outcome.thumbnail, ThumbnailStatus::Undecodable { .. }));

    let thumb = h
        .services
        .retrieval
        .get_thumbnail_bytes(&outcome.photo.id, Some(&alice))
        .await
        .unwrap();
    assert_eq!(thumb.data, data);
    assert_eq!(thumb.content_type, "image/png");
}

#[tokio::test]
async fn test_self_share_and_duplicate_share() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let bob = register(&h, "bob").await;
    let photo = h
        .services
        .photos
        .upload(Some(&alice), upload_request(png(10, 10), "a.png", Visibility::Private))
        .await
        .unwrap()
        .photo;

    assert!(matches!(
        h.services
            .sharing
            .create_share(&photo.id, &alice.id, PermissionLevel::Admin, &alice)
            .await,
        Err(AppError::InvalidArgument(_))
    ));

    h.services
        .sharing
        .create_share(&photo.id, &bob.id, PermissionLevel::Read, &alice)
        .await
        .unwrap();
    assert!(matches!(
        h.services
            .sharing
            .create_share(&photo.id, &bob.id, PermissionLevel::Comment, &alice)
            .await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_admin_share_grants_edit_but_not_ownership() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let bob = register(&h, "bob").await;
    let carol = register(&h, "carol").await;
    let photo = h
        .services
        .photos
        .upload(Some(&alice), upload_request(png(10, 10), "a.png", Visibility::Private))
        .await
        .unwrap()
        .photo;

    h.services
        .sharing
        .create_share(&photo.id, &bob.id, PermissionLevel::Admin, &alice)
        .await
        .unwrap();

    let edited = h
        .services
        .photos
        .update_photo(
            Some(&bob),
            &photo.id,
            UpdatePhotoInput {
                title: Some("Retitled by Bob".to_string()),
                visibility: Some(Visibility::Public),
                ..UpdatePhotoInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.user_id, alice.id);
    assert_eq!(edited.created_at, photo.created_at);

    // Edit rights do not extend to sharing or deleting.
    assert!(matches!(
        h.services
            .sharing
            .create_share(&photo.id, &carol.id, PermissionLevel::Read, &bob)
            .await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.services.photos.delete_photo(Some(&bob), &photo.id).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_role_escalation_rejected() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let bob = register(&h, "bob").await;
    let root = Caller::from(&h.db.insert_user("root", UserRole::Admin).await.unwrap());

    assert!(matches!(
        h.services.users.change_role(&alice, &bob.id, UserRole::Moderator).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        h.services.users.change_role(&alice, &alice.id, UserRole::Admin).await,
        Err(AppError::Forbidden(_))
    ));
    // Not even an existing admin can mint another one.
    assert!(matches!(
        h.services.users.change_role(&root, &bob.id, UserRole::Admin).await,
        Err(AppError::InvalidArgument(_))
    ));
    assert_eq!(h.services.users.caller_for(&alice.id).await.unwrap().role, UserRole::User);
    assert_eq!(h.services.users.caller_for(&bob.id).await.unwrap().role, UserRole::User);
}

#[tokio::test]
async fn test_disabled_user_loses_access() {
    let h = harness().await;
    let alice = register(&h, "alice").await;
    let photo = h
        .services
        .photos
        .upload(Some(&alice), upload_request(png(10, 10), "a.png", Visibility::Private))
        .await
        .unwrap()
        .photo;

    let mut disabled = alice.clone();
    disabled.enabled = false;

    assert!(!h.services.authorization.can_view_photo(Some(&disabled), &photo.id).await);
    assert!(matches!(
        h.services
            .photos
            .upload(Some(&disabled), upload_request(png(10, 10), "b.png", Visibility::Private))
            .await,
        Err(AppError::Forbidden(_))
    ));
}
