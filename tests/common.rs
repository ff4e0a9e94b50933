// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides temp-file databases, quiet logging, and workout fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `liftlog`
//!
//! Every test gets its own database file in a fresh temporary directory. The
//! returned `TempDir` must stay alive for as long as the database is used.

use std::sync::Once;

use liftlog::config::DatabaseConfig;
use liftlog::database::Database;
use liftlog::models::{Workout, WorkoutExercise};
use tempfile::TempDir;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // TEST_LOG raises verbosity when debugging a failing test
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration for a database file inside `dir`
pub fn test_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig::for_path(dir.path().join("liftlog.db"))
}

/// Standard test database setup
pub async fn create_test_db() -> (Database, TempDir) {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let db = Database::open(test_config(&dir)).await.unwrap();
    (db, dir)
}

/// Standard test database with the default user created
pub async fn create_test_db_with_user() -> (Database, TempDir, String) {
    let (db, dir) = create_test_db().await;
    let owner_id = db.ensure_default_user().await.unwrap();
    (db, dir, owner_id)
}

/// Bench press with two sets: 80×10 and 80×8 (volume 1440)
pub fn bench_press() -> WorkoutExercise {
    WorkoutExercise::new("bench", "Bench Press", vec!["chest".into(), "triceps".into()])
        .with_set(80.0, 10)
        .with_set(80.0, 8)
}

/// Squat with a single 100×5 set
pub fn squat() -> WorkoutExercise {
    WorkoutExercise::new("squat", "Barbell Squat", vec!["legs".into()]).with_set(100.0, 5)
}

/// Planned push workout with one bench press exercise
pub fn push_workout(owner_id: &str) -> Workout {
    let mut workout = Workout::new(owner_id, "Push Day").with_exercise(bench_press());
    workout.body_parts = vec!["chest".into(), "triceps".into()];
    workout.planned_duration_minutes = 60;
    workout
}
