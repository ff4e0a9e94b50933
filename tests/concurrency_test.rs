// ABOUTME: Integration tests for concurrent writers sharing one database file
// ABOUTME: Read-then-write transactions must serialize on the write lock instead of failing busy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::{create_test_db_with_user, push_workout};
use liftlog::models::{RecordType, WorkoutSet, WorkoutStatus, WorkoutTemplate};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_record_checks_all_succeed() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;

    let handles: Vec<_> = (1..=16_u32)
        .map(|i| {
            let db = db.clone();
            let owner_id = owner_id.clone();
            tokio::spawn(async move {
                let set = WorkoutSet::new(f64::from(i) * 5.0, 5);
                db.personal_records()
                    .check_and_record(&set, "squat", "Squat", &owner_id, &format!("w{i}"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Whatever the interleaving, the heaviest set ends up as the current best
    let stored = db
        .personal_records()
        .list_for_exercise(&owner_id, "squat")
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
    let weight = stored
        .iter()
        .find(|r| r.record_type == RecordType::Weight)
        .unwrap();
    assert!((weight.value - 80.0).abs() < f64::EPSILON);
    assert_eq!(weight.workout_id, "w16");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_transitions_all_succeed() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let workouts = db.workouts();

    let mut ids = Vec::new();
    for _ in 0..16 {
        ids.push(workouts.save(&push_workout(&owner_id)).await.unwrap());
    }

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let db = db.clone();
            tokio::spawn(async move { db.workouts().start(&id).await })
        })
        .collect();

    for handle in handles {
        let started = handle.await.unwrap().unwrap();
        assert_eq!(started.status, WorkoutStatus::InProgress);
        assert!(started.started_at.is_some());
    }
    assert_eq!(
        workouts
            .count(&owner_id, Some(WorkoutStatus::InProgress))
            .await
            .unwrap(),
        16
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_usage_counts_every_call() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let template = WorkoutTemplate::new(&owner_id, "Legs");
    let template_id = db.templates().save(&template).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let db = db.clone();
            let template_id = template_id.clone();
            tokio::spawn(async move { db.templates().record_usage(&template_id).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = db.templates().get(&template_id).await.unwrap().unwrap();
    assert_eq!(stored.usage_count, 16);
    assert!(db.health_check().await.unwrap().is_healthy());
}
