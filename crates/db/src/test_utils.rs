//! Test utilities for database operations.
//!
//! Provides a throwaway SQLite database migrated with the real migrator, plus
//! fixture helpers for the rows most tests need.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Set,
};
use tracing::debug;

use crate::entities::{Visibility, photo, user, UserRole};

/// A migrated in-memory database that lives as long as this value.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory SQLite database and run all migrations.
    ///
    /// The pool holds a single connection: every connection to `sqlite::memory:`
    /// would otherwise see its own empty database.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        conn.execute_unprepared("PRAGMA foreign_keys = ON").await?;

        crate::migrate(&conn)
            .await
            .map_err(|e| DbErr::Migration(e.to_string()))?;

        debug!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Shared connection handle for repositories.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Insert a user with the given role.
    pub async fn insert_user(&self, id: &str, role: UserRole) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(format!("{id}_name")),
            role: Set(role),
            enabled: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a photo row without any stored bytes.
    pub async fn insert_photo(
        &self,
        id: &str,
        owner_id: &str,
        visibility: Visibility,
    ) -> Result<photo::Model, DbErr> {
        photo::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(owner_id.to_string()),
            title: Set(format!("Photo {id}")),
            description: Set(None),
            original_filename: Set("photo.jpg".to_string()),
            storage_filename: Set(format!("{id}.jpg")),
            thumbnail_filename: Set(Some(format!("thumb_{id}.jpg"))),
            content_type: Set("image/jpeg".to_string()),
            size: Set(0),
            visibility: Set(visibility),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn.as_ref())
        .await
    }
}
