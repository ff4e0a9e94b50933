// ABOUTME: Integration tests for the statistics engine over stored workouts
// ABOUTME: Determinism of volume, completion rate, body part split, and the empty state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{create_test_db_with_user, push_workout};
use liftlog::models::{Workout, WorkoutExercise, WorkoutStats, WorkoutStatus};
use liftlog::statistics::StatisticsEngine;

/// Mark `workout` completed with stamps `minutes` apart starting at `started`
fn completed(mut workout: Workout, started: DateTime<Utc>, minutes: i64) -> Workout {
    workout.status = WorkoutStatus::Completed;
    workout.started_at = Some(started);
    workout.completed_at = Some(started + Duration::minutes(minutes));
    workout
}

#[tokio::test]
async fn test_completed_bench_session_stats() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let workouts = db.workouts();
    let id = workouts.save(&push_workout(&owner_id)).await.unwrap();
    workouts.start(&id).await.unwrap();
    workouts.complete(&id).await.unwrap();

    let engine = StatisticsEngine::new(db.clone());
    let stats = engine.stats(&owner_id).await.unwrap();

    assert_eq!(stats.total_workouts, 1);
    assert_eq!(stats.completed_workouts, 1);
    assert!((stats.completion_rate - 1.0).abs() < f64::EPSILON);
    assert!((stats.total_volume - 1440.0).abs() < f64::EPSILON);
    assert!(stats.average_duration_minutes >= 0.0);

    let volumes = engine.volume_by_body_part(&owner_id).await.unwrap();
    assert_eq!(volumes.len(), 2);
    assert!((volumes["chest"] - 720.0).abs() < f64::EPSILON);
    assert!((volumes["triceps"] - 720.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_zero_weight_session_adds_no_volume() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let workouts = db.workouts();
    let morning = Utc.with_ymd_and_hms(2025, 3, 3, 7, 0, 0).unwrap();

    workouts
        .save(&completed(push_workout(&owner_id), morning, 45))
        .await
        .unwrap();
    let bodyweight = Workout::new(&owner_id, "Bodyweight").with_exercise(
        WorkoutExercise::new("push-up", "Push-Up", vec!["chest".into()]).with_set(0.0, 10),
    );
    workouts
        .save(&completed(bodyweight, morning + Duration::days(1), 30))
        .await
        .unwrap();

    let engine = StatisticsEngine::new(db.clone());
    let stats = engine.stats(&owner_id).await.unwrap();

    assert_eq!(stats.total_workouts, 2);
    assert_eq!(stats.completed_workouts, 2);
    assert!((stats.completion_rate - 1.0).abs() < f64::EPSILON);
    assert!((stats.total_volume - 1440.0).abs() < f64::EPSILON);

    let volumes = engine.volume_by_body_part(&owner_id).await.unwrap();
    assert!((volumes["chest"] - 720.0).abs() < f64::EPSILON);
    assert!((volumes["triceps"] - 720.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_average_duration_uses_stored_stamps() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let workouts = db.workouts();
    let morning = Utc.with_ymd_and_hms(2025, 3, 3, 7, 0, 0).unwrap();

    for (day, minutes) in [(0, 45), (1, 30), (2, 60)] {
        workouts
            .save(&completed(
                push_workout(&owner_id),
                morning + Duration::days(day),
                minutes,
            ))
            .await
            .unwrap();
    }
    // Planned and in-progress sessions never count towards the average
    workouts.save(&push_workout(&owner_id)).await.unwrap();
    let mut ongoing = push_workout(&owner_id);
    ongoing.status = WorkoutStatus::InProgress;
    ongoing.started_at = Some(morning);
    workouts.save(&ongoing).await.unwrap();

    let stats = StatisticsEngine::new(db.clone())
        .stats(&owner_id)
        .await
        .unwrap();

    assert_eq!(stats.total_workouts, 5);
    assert_eq!(stats.completed_workouts, 3);
    assert!((stats.average_duration_minutes - 45.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_stats_are_deterministic_and_owner_scoped() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let workouts = db.workouts();
    workouts.save(&push_workout(&owner_id)).await.unwrap();
    let done = workouts.save(&push_workout(&owner_id)).await.unwrap();
    workouts.start(&done).await.unwrap();
    workouts.complete(&done).await.unwrap();
    workouts.save(&push_workout("someone-else")).await.unwrap();

    let engine = StatisticsEngine::new(db.clone());
    let first = engine.stats(&owner_id).await.unwrap();
    let second = engine.stats(&owner_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total_workouts, 2);
    assert!((first.completion_rate - 0.5).abs() < f64::EPSILON);
    assert!((first.total_volume - 2880.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_empty_state_has_no_division_by_zero() {
    let (db, _dir, owner_id) = create_test_db_with_user().await;
    let engine = StatisticsEngine::new(db.clone());

    assert_eq!(engine.stats(&owner_id).await.unwrap(), WorkoutStats::default());
    assert!(engine.volume_by_body_part(&owner_id).await.unwrap().is_empty());
}
