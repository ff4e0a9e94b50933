// ABOUTME: Workout aggregate persistence: header, exercises, and sets written as one unit
// ABOUTME: Transactional CRUD, filtered and date-ranged listing, and status transitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Workout Store
//!
//! A workout is stored across three tables (`workouts`, `workout_exercises`,
//! `workout_sets`). Every write touches all three inside one transaction and
//! every read loads the header and its children inside one read transaction,
//! so no caller ever observes a header without its subtree.
//!
//! `update` replaces the subtree wholesale: the exercise rows of the workout are
//! deleted (sets follow through `ON DELETE CASCADE`) and the normalized subtree
//! is inserted again. Child ids are derived from the parent id and position, so
//! they are regenerated rather than diffed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{debug, info};

use super::mappers::{
    count_to_u64, decode_string_list, encode_string_list, format_optional_timestamp,
    format_timestamp, parse_optional_timestamp, parse_timestamp, to_u32,
};
use super::transactions::SqliteTransactionGuard;
use super::validation::{validate_lifecycle, validate_workout};
use super::Database;
use crate::clock;
use crate::errors::{AppError, AppResult};
use crate::identifiers::new_root_id;
use crate::models::{normalize_exercises, PageParams, Workout, WorkoutExercise, WorkoutSet, WorkoutStatus};

const WORKOUT_COLUMNS: &str = r"
    id, owner_id, name, body_parts, planned_duration_minutes, status,
    created_at, started_at, completed_at, updated_at, notes, template_id
";

/// Workout persistence backed by [`Database`]
#[derive(Clone)]
pub struct WorkoutsManager {
    db: Database,
}

impl WorkoutsManager {
    /// Create a new workouts manager
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new workout aggregate and return its id
    ///
    /// Exercises are normalized first: duplicates of the same exercise are
    /// merged into the first occurrence, order indices become `0..n` and set
    /// numbers `1..m`. An empty id is replaced by a fresh UUID.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` if a required field is missing or the id
    /// already exists, `InvalidInput` for malformed ids or sets or for a status
    /// its lifecycle stamps contradict, or a storage error
    pub async fn save(&self, workout: &Workout) -> AppResult<String> {
        validate_workout(workout)?;
        validate_lifecycle(workout)?;

        let id = if workout.id.trim().is_empty() {
            new_root_id()
        } else {
            workout.id.clone()
        };
        let normalized = Workout {
            id: id.clone(),
            exercises: normalize_exercises(&id, workout.exercises.clone()),
            ..workout.clone()
        };

        self.db
            .with_retry("Failed to save workout", |pool| {
                let normalized = &normalized;
                async move {
                    let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                    insert_header(guard.executor()?, normalized).await?;
                    insert_exercises(guard.executor()?, &normalized.id, &normalized.exercises)
                        .await?;
                    guard.commit().await
                }
            })
            .await
            .map_err(|e| e.with_resource_id(&id))?;

        info!(
            workout_id = %id,
            owner_id = %workout.owner_id,
            exercises = normalized.exercises.len(),
            sets = normalized.set_count(),
            "Workout saved"
        );
        Ok(id)
    }

    /// Replace the mutable header fields and the whole exercise subtree
    ///
    /// Status, lifecycle timestamps, owner, and template link are left as
    /// stored; they change only through [`start`](Self::start),
    /// [`complete`](Self::complete), and [`cancel`](Self::cancel).
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the workout does not exist, or a
    /// validation or storage error
    pub async fn update(&self, workout: &Workout) -> AppResult<()> {
        validate_workout(workout)?;
        let exercises = normalize_exercises(&workout.id, workout.exercises.clone());
        let updated_at = format_timestamp(clock::now());
        let body_parts = encode_string_list(&workout.body_parts)?;

        let found = self
            .db
            .with_retry("Failed to update workout", |pool| {
                let (exercises, updated_at, body_parts) = (&exercises, &updated_at, &body_parts);
                async move {
                    let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;

                    let result = sqlx::query(
                        r"
                        UPDATE workouts
                        SET name = $1, body_parts = $2, planned_duration_minutes = $3,
                            notes = $4, updated_at = $5
                        WHERE id = $6
                        ",
                    )
                    .bind(&workout.name)
                    .bind(body_parts)
                    .bind(i64::from(workout.planned_duration_minutes))
                    .bind(&workout.notes)
                    .bind(updated_at)
                    .bind(&workout.id)
                    .execute(guard.executor()?)
                    .await?;

                    if result.rows_affected() == 0 {
                        guard.rollback().await?;
                        return Ok(false);
                    }

                    sqlx::query("DELETE FROM workout_exercises WHERE workout_id = $1")
                        .bind(&workout.id)
                        .execute(guard.executor()?)
                        .await?;
                    insert_exercises(guard.executor()?, &workout.id, exercises).await?;

                    guard.commit().await?;
                    Ok(true)
                }
            })
            .await
            .map_err(|e| e.with_resource_id(&workout.id))?;

        if !found {
            return Err(AppError::not_found(format!("Workout {}", workout.id))
                .with_resource_id(&workout.id));
        }

        info!(
            workout_id = %workout.id,
            exercises = exercises.len(),
            "Workout updated"
        );
        Ok(())
    }

    /// Load a full workout aggregate
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed
    pub async fn get(&self, workout_id: &str) -> AppResult<Option<Workout>> {
        let workout = self
            .db
            .with_retry("Failed to get workout", |pool| async move {
                let mut guard = SqliteTransactionGuard::begin(&pool).await?;

                let query = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1");
                let row = sqlx::query(&query)
                    .bind(workout_id)
                    .fetch_optional(guard.executor()?)
                    .await?;

                let workout = match row {
                    Some(row) => {
                        let mut workout = row_to_workout(&row)?;
                        workout.exercises = load_exercises(guard.executor()?, workout_id).await?;
                        Some(workout)
                    }
                    None => None,
                };

                guard.commit().await?;
                Ok(workout)
            })
            .await?;

        debug!(workout_id = %workout_id, found = workout.is_some(), "Workout lookup");
        Ok(workout)
    }

    /// Delete a workout and its whole subtree
    ///
    /// Returns whether a workout was removed; deleting an absent id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub async fn delete(&self, workout_id: &str) -> AppResult<bool> {
        let removed = self
            .db
            .with_retry("Failed to delete workout", |pool| async move {
                let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                let result = sqlx::query("DELETE FROM workouts WHERE id = $1")
                    .bind(workout_id)
                    .execute(guard.executor()?)
                    .await?;
                guard.commit().await?;
                Ok(result.rows_affected() > 0)
            })
            .await?;

        if removed {
            info!(workout_id = %workout_id, "Workout deleted");
        }
        Ok(removed)
    }

    /// List an owner's workouts, newest first, optionally filtered by status
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(
        &self,
        owner_id: &str,
        status: Option<WorkoutStatus>,
        page: PageParams,
    ) -> AppResult<Vec<Workout>> {
        let status = status.map(|s| s.as_str());
        let query = format!(
            r"
            SELECT {WORKOUT_COLUMNS}
            FROM workouts
            WHERE owner_id = $1 AND ($2 IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        );

        let workouts = self
            .db
            .with_retry("Failed to list workouts", |pool| {
                let query = &query;
                async move {
                    let mut guard = SqliteTransactionGuard::begin(&pool).await?;
                    let rows = sqlx::query(query)
                        .bind(owner_id)
                        .bind(status)
                        .bind(page.sql_limit())
                        .bind(page.sql_offset())
                        .fetch_all(guard.executor()?)
                        .await?;
                    let workouts = load_aggregates(guard.executor()?, &rows).await?;
                    guard.commit().await?;
                    Ok(workouts)
                }
            })
            .await?;

        debug!(owner_id = %owner_id, ?status, count = workouts.len(), "Listed workouts");
        Ok(workouts)
    }

    /// List an owner's workouts created within `[start, end]`, newest first
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `start` is after `end`, or an error if the
    /// query fails
    pub async fn list_by_date_range(
        &self,
        owner_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Workout>> {
        if start > end {
            return Err(AppError::invalid_input(format!(
                "date range start {start} is after end {end}"
            )));
        }

        // Compare at the precision timestamps are stored with
        let start = format_timestamp(clock::to_storage_precision(start));
        let end = format_timestamp(clock::to_storage_precision(end));
        let query = format!(
            r"
            SELECT {WORKOUT_COLUMNS}
            FROM workouts
            WHERE owner_id = $1 AND created_at >= $2 AND created_at <= $3
            ORDER BY created_at DESC, id DESC
            "
        );

        let workouts = self
            .db
            .with_retry("Failed to list workouts by date range", |pool| {
                let (query, start, end) = (&query, &start, &end);
                async move {
                    let mut guard = SqliteTransactionGuard::begin(&pool).await?;
                    let rows = sqlx::query(query)
                        .bind(owner_id)
                        .bind(start)
                        .bind(end)
                        .fetch_all(guard.executor()?)
                        .await?;
                    let workouts = load_aggregates(guard.executor()?, &rows).await?;
                    guard.commit().await?;
                    Ok(workouts)
                }
            })
            .await?;

        debug!(owner_id = %owner_id, %start, %end, count = workouts.len(), "Listed workouts by date range");
        Ok(workouts)
    }

    /// Every workout of an owner, with exercises and sets
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_all(&self, owner_id: &str) -> AppResult<Vec<Workout>> {
        let query = format!(
            r"
            SELECT {WORKOUT_COLUMNS}
            FROM workouts
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "
        );

        self.db
            .with_retry("Failed to load workouts", |pool| {
                let query = &query;
                async move {
                    let mut guard = SqliteTransactionGuard::begin(&pool).await?;
                    let rows = sqlx::query(query)
                        .bind(owner_id)
                        .fetch_all(guard.executor()?)
                        .await?;
                    let workouts = load_aggregates(guard.executor()?, &rows).await?;
                    guard.commit().await?;
                    Ok(workouts)
                }
            })
            .await
    }

    /// Count an owner's workouts, optionally only those in `status`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count(&self, owner_id: &str, status: Option<WorkoutStatus>) -> AppResult<u64> {
        let status = status.map(|s| s.as_str());
        self.db
            .with_retry("Failed to count workouts", |pool| async move {
                let count: i64 = sqlx::query_scalar(
                    r"
                    SELECT COUNT(*) FROM workouts
                    WHERE owner_id = $1 AND ($2 IS NULL OR status = $2)
                    ",
                )
                .bind(owner_id)
                .bind(status)
                .fetch_one(&pool)
                .await?;
                Ok(count_to_u64(count))
            })
            .await
    }

    /// Move a planned workout to `inProgress`, stamping `started_at`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent or `InvalidStateTransition` if the
    /// workout is not planned
    pub async fn start(&self, workout_id: &str) -> AppResult<Workout> {
        self.transition(workout_id, WorkoutStatus::InProgress).await
    }

    /// Move an in-progress workout to `completed`, stamping `completed_at`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent or `InvalidStateTransition` if the
    /// workout is not in progress
    pub async fn complete(&self, workout_id: &str) -> AppResult<Workout> {
        self.transition(workout_id, WorkoutStatus::Completed).await
    }

    /// Cancel a planned or in-progress workout
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent or `InvalidStateTransition` if the
    /// workout is already terminal
    pub async fn cancel(&self, workout_id: &str) -> AppResult<Workout> {
        self.transition(workout_id, WorkoutStatus::Cancelled).await
    }

    /// Compare-and-set status change inside one transaction
    async fn transition(&self, workout_id: &str, target: WorkoutStatus) -> AppResult<Workout> {
        let context = format!("Failed to move workout to {target}");
        let (from, workout) = self
            .db
            .with_retry(&context, |pool| async move {
                let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;

                let current: Option<String> =
                    sqlx::query_scalar("SELECT status FROM workouts WHERE id = $1")
                        .bind(workout_id)
                        .fetch_optional(guard.executor()?)
                        .await?;
                let Some(current) = current else {
                    guard.rollback().await?;
                    return Err(AppError::not_found(format!("Workout {workout_id}"))
                        .with_resource_id(workout_id));
                };

                let from = WorkoutStatus::parse(&current);
                if !from.can_transition_to(target) {
                    guard.rollback().await?;
                    return Err(AppError::invalid_state_transition(from.as_str(), target.as_str())
                        .with_resource_id(workout_id));
                }

                let now = format_timestamp(clock::now());
                sqlx::query(
                    r"
                    UPDATE workouts
                    SET status = $1,
                        started_at = CASE WHEN $1 = 'inProgress' THEN COALESCE(started_at, $2) ELSE started_at END,
                        completed_at = CASE WHEN $1 = 'completed' THEN COALESCE(completed_at, $2) ELSE completed_at END,
                        updated_at = $2
                    WHERE id = $3 AND status = $4
                    ",
                )
                .bind(target.as_str())
                .bind(&now)
                .bind(workout_id)
                .bind(from.as_str())
                .execute(guard.executor()?)
                .await?;

                let query = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1");
                let row = sqlx::query(&query)
                    .bind(workout_id)
                    .fetch_one(guard.executor()?)
                    .await?;
                let mut workout = row_to_workout(&row)?;
                workout.exercises = load_exercises(guard.executor()?, workout_id).await?;

                guard.commit().await?;
                Ok((from, workout))
            })
            .await?;

        info!(
            workout_id = %workout_id,
            from = from.as_str(),
            to = target.as_str(),
            "Workout status changed"
        );
        Ok(workout)
    }
}

pub(super) async fn insert_header(conn: &mut SqliteConnection, workout: &Workout) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO workouts (
            id, owner_id, name, body_parts, planned_duration_minutes, status,
            created_at, started_at, completed_at, updated_at, notes, template_id
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ",
    )
    .bind(&workout.id)
    .bind(&workout.owner_id)
    .bind(&workout.name)
    .bind(encode_string_list(&workout.body_parts)?)
    .bind(i64::from(workout.planned_duration_minutes))
    .bind(workout.status.as_str())
    .bind(format_timestamp(workout.created_at))
    .bind(format_optional_timestamp(workout.started_at))
    .bind(format_optional_timestamp(workout.completed_at))
    .bind(format_timestamp(workout.updated_at))
    .bind(&workout.notes)
    .bind(&workout.template_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Insert already-normalized exercises and their sets
pub(super) async fn insert_exercises(
    conn: &mut SqliteConnection,
    workout_id: &str,
    exercises: &[WorkoutExercise],
) -> AppResult<()> {
    for exercise in exercises {
        sqlx::query(
            r"
            INSERT INTO workout_exercises (
                id, workout_id, exercise_id, exercise_name, body_parts,
                equipment, order_index, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(&exercise.id)
        .bind(workout_id)
        .bind(&exercise.exercise_id)
        .bind(&exercise.exercise_name)
        .bind(encode_string_list(&exercise.body_parts)?)
        .bind(&exercise.equipment)
        .bind(i64::from(exercise.order_index))
        .bind(&exercise.notes)
        .execute(&mut *conn)
        .await?;

        for set in &exercise.sets {
            sqlx::query(
                r"
                INSERT INTO workout_sets (
                    id, workout_exercise_id, set_number, weight, reps, volume, completed
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(&set.id)
            .bind(&exercise.id)
            .bind(i64::from(set.set_number))
            .bind(set.weight)
            .bind(i64::from(set.reps))
            .bind(set.volume())
            .bind(set.completed)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

/// Exercises of one workout in order, each with its sets in order
async fn load_exercises(
    conn: &mut SqliteConnection,
    workout_id: &str,
) -> AppResult<Vec<WorkoutExercise>> {
    let exercise_rows = sqlx::query(
        r"
        SELECT id, exercise_id, exercise_name, body_parts, equipment, order_index, notes
        FROM workout_exercises
        WHERE workout_id = $1
        ORDER BY order_index ASC
        ",
    )
    .bind(workout_id)
    .fetch_all(&mut *conn)
    .await?;

    let set_rows = sqlx::query(
        r"
        SELECT s.id, s.workout_exercise_id, s.set_number, s.weight, s.reps, s.completed
        FROM workout_sets s
        JOIN workout_exercises e ON e.id = s.workout_exercise_id
        WHERE e.workout_id = $1
        ORDER BY e.order_index ASC, s.set_number ASC
        ",
    )
    .bind(workout_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut sets_by_exercise: HashMap<String, Vec<WorkoutSet>> = HashMap::new();
    for row in &set_rows {
        let set = row_to_set(row)?;
        sets_by_exercise
            .entry(set.workout_exercise_id.clone())
            .or_default()
            .push(set);
    }

    exercise_rows
        .iter()
        .map(|row| {
            let mut exercise = row_to_exercise(row)?;
            exercise.sets = sets_by_exercise.remove(&exercise.id).unwrap_or_default();
            Ok(exercise)
        })
        .collect()
}

async fn load_aggregates(conn: &mut SqliteConnection, rows: &[SqliteRow]) -> AppResult<Vec<Workout>> {
    let mut workouts = Vec::with_capacity(rows.len());
    for row in rows {
        let mut workout = row_to_workout(row)?;
        workout.exercises = load_exercises(&mut *conn, &workout.id).await?;
        workouts.push(workout);
    }
    Ok(workouts)
}

/// Convert a `workouts` row to a header with no exercises
fn row_to_workout(row: &SqliteRow) -> AppResult<Workout> {
    let body_parts: String = row.try_get("body_parts")?;
    let planned: i64 = row.try_get("planned_duration_minutes")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let started_at: Option<String> = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Workout {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        body_parts: decode_string_list(&body_parts)?,
        planned_duration_minutes: to_u32(planned, "planned_duration_minutes")?,
        status: WorkoutStatus::parse(&status),
        created_at: parse_timestamp(&created_at)?,
        started_at: parse_optional_timestamp(started_at.as_deref())?,
        completed_at: parse_optional_timestamp(completed_at.as_deref())?,
        updated_at: parse_timestamp(&updated_at)?,
        notes: row.try_get("notes")?,
        template_id: row.try_get("template_id")?,
        exercises: Vec::new(),
    })
}

fn row_to_exercise(row: &SqliteRow) -> AppResult<WorkoutExercise> {
    let body_parts: String = row.try_get("body_parts")?;
    let order_index: i64 = row.try_get("order_index")?;

    Ok(WorkoutExercise {
        id: row.try_get("id")?,
        exercise_id: row.try_get("exercise_id")?,
        exercise_name: row.try_get("exercise_name")?,
        body_parts: decode_string_list(&body_parts)?,
        equipment: row.try_get("equipment")?,
        order_index: to_u32(order_index, "order_index")?,
        notes: row.try_get("notes")?,
        sets: Vec::new(),
    })
}

fn row_to_set(row: &SqliteRow) -> AppResult<WorkoutSet> {
    let set_number: i64 = row.try_get("set_number")?;
    let reps: i64 = row.try_get("reps")?;

    Ok(WorkoutSet {
        id: row.try_get("id")?,
        workout_exercise_id: row.try_get("workout_exercise_id")?,
        set_number: to_u32(set_number, "set_number")?,
        weight: row.try_get("weight")?,
        reps: to_u32(reps, "reps")?,
        completed: row.try_get("completed")?,
    })
}
