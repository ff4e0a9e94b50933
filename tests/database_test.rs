// ABOUTME: Integration tests for the schema manager
// ABOUTME: Schema creation, health checks, default user, preferences, reset, close/reopen, and retry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use std::sync::atomic::{AtomicU32, Ordering};

use common::{create_test_db, create_test_db_with_user, init_test_logging, push_workout, test_config};
use liftlog::config::DatabaseConfig;
use liftlog::constants::{ids, tables};
use liftlog::database::Database;
use liftlog::errors::{AppError, AppResult, ErrorCode};
use liftlog::models::{UserPreferences, WeightUnit};
use tempfile::TempDir;

#[tokio::test]
async fn test_open_creates_complete_schema() {
    let (db, _dir) = create_test_db().await;
    let health = db.health_check().await.unwrap();
    assert!(health.open);
    assert!(health.missing_tables.is_empty());
    assert!(health.is_healthy());
}

#[tokio::test]
async fn test_open_creates_missing_directories() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("liftlog.db");

    let db = Database::open(DatabaseConfig::for_path(&path)).await.unwrap();

    assert!(path.exists());
    assert!(db.health_check().await.unwrap().is_healthy());
}

#[tokio::test]
async fn test_reopen_is_idempotent_and_keeps_data() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let db = Database::open(test_config(&dir)).await.unwrap();
    let owner_id = db.ensure_default_user().await.unwrap();
    let id = db.workouts().save(&push_workout(&owner_id)).await.unwrap();
    db.close().await;
    drop(db);

    let reopened = Database::open(test_config(&dir)).await.unwrap();
    let workout = reopened.workouts().get(&id).await.unwrap().unwrap();
    assert_eq!(workout.exercises.len(), 1);
    assert_eq!(reopened.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_in_memory_database_round_trips() {
    init_test_logging();
    let db = Database::open(DatabaseConfig::in_memory()).await.unwrap();
    let owner_id = db.ensure_default_user().await.unwrap();
    let id = db.workouts().save(&push_workout(&owner_id)).await.unwrap();
    assert!(db.workouts().get(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_default_user_is_stable() {
    let (db, _dir) = create_test_db().await;

    let first = db.ensure_default_user().await.unwrap();
    let second = db.ensure_default_user().await.unwrap();

    assert_eq!(first, ids::DEFAULT_USER_ID);
    assert_eq!(first, second);
    assert_eq!(db.count_users().await.unwrap(), 1);
    let user = db.get_user(&first).await.unwrap().unwrap();
    assert_eq!(user.display_name, ids::DEFAULT_USER_NAME);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_default_user_creation() {
    let (db, _dir) = create_test_db().await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.ensure_default_user().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), ids::DEFAULT_USER_ID);
    }
    assert_eq!(db.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_preferences_round_trip() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;

    let defaults = db.get_preferences(&owner_id).await.unwrap().unwrap();
    assert_eq!(defaults.weight_unit, WeightUnit::Kg);
    assert_eq!(defaults.default_rest_seconds, 90);

    let changed = UserPreferences {
        weight_unit: WeightUnit::Lb,
        default_rest_seconds: 120,
        ..defaults
    };
    let stored = db.update_preferences(&changed).await.unwrap();
    assert_eq!(db.get_preferences(&owner_id).await.unwrap().unwrap(), stored);
    assert_eq!(stored.weight_unit, WeightUnit::Lb);

    let error = db
        .update_preferences(&UserPreferences::defaults_for("nobody"))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_reset_wipes_data_and_leaves_healthy_schema() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let id = db.workouts().save(&push_workout(&owner_id)).await.unwrap();

    db.reset().await.unwrap();

    assert!(db.health_check().await.unwrap().is_healthy());
    assert!(db.workouts().get(&id).await.unwrap().is_none());
    assert_eq!(db.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_table_is_reported_and_recreated() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let id = db.workouts().save(&push_workout(&owner_id)).await.unwrap();
    sqlx::query("DROP TABLE personal_records")
        .execute(&db.pool().unwrap())
        .await
        .unwrap();

    let health = db.health_check().await.unwrap();
    assert!(health.open);
    assert_eq!(health.missing_tables, vec![tables::PERSONAL_RECORDS.to_owned()]);

    let stats = db.personal_records().stats(&owner_id).await.unwrap();
    assert_eq!(stats.total_records, 0);
    assert!(db.health_check().await.unwrap().is_healthy());
    assert!(db.workouts().get(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_closed_handle_reopens_on_next_access() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let id = db.workouts().save(&push_workout(&owner_id)).await.unwrap();

    db.close().await;
    let health = db.health_check().await.unwrap();
    assert!(!health.open);
    assert_eq!(health.missing_tables.len(), tables::ALL.len());

    assert!(db.workouts().get(&id).await.unwrap().is_some());
    assert!(db.health_check().await.unwrap().is_healthy());
}

#[tokio::test]
async fn test_storage_unavailable_gets_one_retry() {
    let (db, _dir) = create_test_db().await;
    let calls = AtomicU32::new(0);

    let value = db
        .with_retry("Failed to probe", |_pool| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(AppError::storage_unavailable("handle not open"))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retry_budget_exhaustion_surfaces_error() {
    let (db, _dir) = create_test_db().await;
    let calls = AtomicU32::new(0);

    let result: AppResult<()> = db
        .with_retry("Failed to probe", |_pool| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::storage_unavailable("still closed")) }
        })
        .await;

    let error = result.unwrap_err();
    assert_eq!(error.code, ErrorCode::StorageUnavailable);
    assert!(error.message.starts_with("Failed to probe"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_constraint_violations_are_not_retried() {
    let (db, _dir) = create_test_db().await;
    let calls = AtomicU32::new(0);

    let result: AppResult<()> = db
        .with_retry("Failed to insert", |_pool| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::constraint_violation("duplicate")) }
        })
        .await;

    assert_eq!(result.unwrap_err().code, ErrorCode::ConstraintViolation);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_child_ids_are_derived_from_parent() {
    assert_eq!(Database::generate_child_id("w1", "bench"), "w1:bench");
    assert_eq!(Database::generate_child_id("w1:bench", 2), "w1:bench:2");
}
