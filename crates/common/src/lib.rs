//! Common utilities and shared types for photoshare.
//!
//! This crate provides foundational components used across all photoshare crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID entity ids and random tokens via [`IdGenerator`]
//! - **Storage**: Flat-key file storage for originals and thumbnails
//! - **Telemetry**: `tracing` subscriber initialisation
//!
//! # Example
//!
//! ```no_run
//! use photoshare_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     photoshare_common::telemetry::init(&config.logging);
//!     let id = IdGenerator::new().generate();
//!     tracing::info!(%id, "Generated ID");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;
pub mod telemetry;

pub use config::{Config, DatabaseConfig, IngestionConfig, LoggingConfig, StorageConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{LocalStorage, StorageBackend, StorageService};
