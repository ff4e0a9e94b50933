// ABOUTME: Main library entry point for the LiftLog workout persistence and analytics engine
// ABOUTME: Exposes the schema manager, workout and template stores, PR detection, and statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

#![deny(unsafe_code)]

//! # LiftLog
//!
//! Local-first storage for strength training: workouts with their exercises and
//! sets, reusable templates, personal records, and the statistics derived from
//! them, all kept in one `SQLite` file.
//!
//! ## Architecture
//!
//! - **database**: [`database::Database`] owns the pool and schema; the stores
//!   (`WorkoutsManager`, `TemplatesManager`, `PersonalRecordsManager`) hang off it
//! - **statistics**: pure aggregation over loaded workouts
//! - **catalog**: the exercise catalog seam used to snapshot exercise metadata
//! - **config** / **logging**: environment-driven configuration and tracing setup
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use liftlog::config::DatabaseConfig;
//! use liftlog::database::Database;
//! use liftlog::errors::AppResult;
//! use liftlog::models::{Workout, WorkoutExercise};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let db = Database::open(DatabaseConfig::from_env()?).await?;
//!     let owner_id = db.ensure_default_user().await?;
//!
//!     let workout = Workout::new(&owner_id, "Push").with_exercise(
//!         WorkoutExercise::new("bench", "Bench Press", vec!["chest".into()]).with_set(80.0, 10),
//!     );
//!     let id = db.workouts().save(&workout).await?;
//!     db.workouts().start(&id).await?;
//!     Ok(())
//! }
//! ```

/// Exercise catalog lookup and snapshotting
pub mod catalog;

/// Environment-driven configuration
pub mod config;

/// Application constants (re-exported from `liftlog-core`)
pub mod constants;

/// Schema manager and aggregate stores
pub mod database;

/// Error types (re-exported from `liftlog-core`)
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Domain models (re-exported from `liftlog-core`)
pub mod models;

/// Workout statistics
pub mod statistics;

pub use liftlog_core::{clock, identifiers, pagination};
