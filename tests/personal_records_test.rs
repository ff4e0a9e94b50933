// ABOUTME: Integration tests for personal record detection
// ABOUTME: First-set records, idempotence, independent record types, and record statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::create_test_db_with_user;
use liftlog::errors::ErrorCode;
use liftlog::models::{RecordType, WorkoutSet};

#[tokio::test]
async fn test_first_set_sets_all_three_records() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let records = db.personal_records();

    let set = WorkoutSet::new(100.0, 5);
    let created = records
        .check_and_record(&set, "squat", "Squat", &owner_id, "w1")
        .await
        .unwrap();

    let types: Vec<RecordType> = created.iter().map(|r| r.record_type).collect();
    assert_eq!(types, vec![RecordType::Weight, RecordType::Volume, RecordType::Reps]);
    assert!((created[0].value - 100.0).abs() < f64::EPSILON);
    assert!((created[1].value - 500.0).abs() < f64::EPSILON);
    assert!((created[2].value - 5.0).abs() < f64::EPSILON);
    assert!(created.iter().all(|r| r.previous_value.is_none()));
}

#[tokio::test]
async fn test_same_set_twice_yields_no_new_records() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let records = db.personal_records();
    let set = WorkoutSet::new(100.0, 5);

    assert_eq!(
        records
            .check_and_record(&set, "squat", "Squat", &owner_id, "w1")
            .await
            .unwrap()
            .len(),
        3
    );
    assert!(records
        .check_and_record(&set, "squat", "Squat", &owner_id, "w2")
        .await
        .unwrap()
        .is_empty());

    let stored = records.list_for_exercise(&owner_id, "squat").await.unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|r| r.workout_id == "w1"));
}

#[tokio::test]
async fn test_record_types_are_independent() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let records = db.personal_records();
    records
        .check_and_record(&WorkoutSet::new(100.0, 5), "squat", "Squat", &owner_id, "w1")
        .await
        .unwrap();

    // Lighter but more reps: new reps and volume records, weight untouched
    let created = records
        .check_and_record(&WorkoutSet::new(80.0, 8), "squat", "Squat", &owner_id, "w2")
        .await
        .unwrap();

    let types: Vec<RecordType> = created.iter().map(|r| r.record_type).collect();
    assert_eq!(types, vec![RecordType::Volume, RecordType::Reps]);
    assert_eq!(created[0].previous_value, Some(500.0));
    assert!((created[0].improvement().unwrap() - 140.0).abs() < f64::EPSILON);

    let stored = records.list_for_exercise(&owner_id, "squat").await.unwrap();
    let weight = stored.iter().find(|r| r.record_type == RecordType::Weight).unwrap();
    assert!((weight.value - 100.0).abs() < f64::EPSILON);
    assert_eq!(weight.workout_id, "w1");
    let volume = stored.iter().find(|r| r.record_type == RecordType::Volume).unwrap();
    assert!((volume.value - 640.0).abs() < f64::EPSILON);
    assert_eq!(volume.id, created[0].id);
}

#[tokio::test]
async fn test_equal_value_is_not_a_record() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let records = db.personal_records();
    records
        .check_and_record(&WorkoutSet::new(100.0, 5), "squat", "Squat", &owner_id, "w1")
        .await
        .unwrap();

    // Same weight, fewer reps: nothing beats the stored bests
    let created = records
        .check_and_record(&WorkoutSet::new(100.0, 3), "squat", "Squat", &owner_id, "w2")
        .await
        .unwrap();
    assert!(created.is_empty());
}

#[tokio::test]
async fn test_pending_sets_never_set_records() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let created = db
        .personal_records()
        .check_and_record(&WorkoutSet::new(100.0, 5).pending(), "squat", "Squat", &owner_id, "w1")
        .await
        .unwrap();
    assert!(created.is_empty());
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let records = db.personal_records();

    let error = records
        .check_and_record(&WorkoutSet::new(100.0, 5), "squat", "Squat", "", "w1")
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ConstraintViolation);

    let error = records
        .check_and_record(&WorkoutSet::new(100.0, 0), "squat", "Squat", &owner_id, "w1")
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_records_are_scoped_per_owner_and_exercise() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let records = db.personal_records();
    let set = WorkoutSet::new(60.0, 10);

    records.check_and_record(&set, "bench", "Bench", &owner_id, "w1").await.unwrap();
    assert_eq!(
        records.check_and_record(&set, "row", "Row", &owner_id, "w1").await.unwrap().len(),
        3
    );
    assert_eq!(
        records.check_and_record(&set, "bench", "Bench", "other", "w9").await.unwrap().len(),
        3
    );

    let stats = records.stats(&owner_id).await.unwrap();
    assert_eq!(stats.total_records, 6);
    assert_eq!(stats.records_this_month, 6);
}

#[tokio::test]
async fn test_recent_records_newest_first() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let records = db.personal_records();

    records
        .check_and_record(&WorkoutSet::new(60.0, 10), "bench", "Bench", &owner_id, "w1")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    records
        .check_and_record(&WorkoutSet::new(100.0, 5), "squat", "Squat", &owner_id, "w2")
        .await
        .unwrap();

    let recent = records.list_recent(&owner_id, 3).await.unwrap();
    assert_eq!(recent.len(), 3);
    assert!(recent.iter().all(|r| r.exercise_id == "squat"));
    assert_eq!(records.list_recent(&owner_id, 10).await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_empty_record_stats() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let stats = db.personal_records().stats(&owner_id).await.unwrap();
    assert_eq!(stats.total_records, 0);
    assert_eq!(stats.records_this_month, 0);
}
