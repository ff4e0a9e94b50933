// ABOUTME: Personal record detection for completed sets across weight, volume, and reps
// ABOUTME: One current-best row per owner, exercise, and record type, upserted transactionally
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Personal Record Detector
//!
//! Every completed set is compared against the owner's current best for the
//! exercise in each [`RecordType`]. A record is written only when the set
//! strictly beats the stored value, or when no value is stored yet. The three
//! comparisons are independent and run inside one transaction, so checking the
//! same set twice produces records only the first time.

use chrono::{DateTime, Datelike, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

use super::mappers::{count_to_u64, format_timestamp, parse_timestamp};
use super::transactions::SqliteTransactionGuard;
use super::validation::{require_field, validate_set};
use super::Database;
use crate::clock;
use crate::errors::{AppError, AppResult};
use crate::identifiers::new_root_id;
use crate::models::{PersonalRecord, RecordStats, RecordType, WorkoutSet};

const RECORD_COLUMNS: &str = r"
    id, owner_id, exercise_id, exercise_name, record_type, value,
    workout_id, achieved_at, previous_value
";

/// Personal record detection and queries backed by [`Database`]
#[derive(Clone)]
pub struct PersonalRecordsManager {
    db: Database,
}

impl PersonalRecordsManager {
    /// Create a new personal records manager
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Compare a set against the current bests and store any new records
    ///
    /// Returns the records this set established, in weight, volume, reps
    /// order. Sets not marked completed never establish records.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` for missing ids, `InvalidInput` for a
    /// malformed set, or a storage error
    pub async fn check_and_record(
        &self,
        set: &WorkoutSet,
        exercise_id: &str,
        exercise_name: &str,
        owner_id: &str,
        workout_id: &str,
    ) -> AppResult<Vec<PersonalRecord>> {
        require_field(owner_id, "owner_id")?;
        require_field(exercise_id, "exercise_id")?;
        require_field(workout_id, "workout_id")?;
        validate_set(set)?;

        if !set.completed {
            return Ok(Vec::new());
        }

        let achieved_at = clock::now();
        let achieved_at_text = format_timestamp(achieved_at);

        let records = self
            .db
            .with_retry("Failed to check personal records", |pool| {
                let achieved_at_text = &achieved_at_text;
                async move {
                    let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                    let mut records = Vec::new();

                    for record_type in RecordType::ALL {
                        let value = record_type.value_for(set);
                        let current: Option<f64> = sqlx::query_scalar(
                            r"
                            SELECT value FROM personal_records
                            WHERE owner_id = $1 AND exercise_id = $2 AND record_type = $3
                            ",
                        )
                        .bind(owner_id)
                        .bind(exercise_id)
                        .bind(record_type.as_str())
                        .fetch_optional(guard.executor()?)
                        .await?;

                        if current.is_some_and(|best| value <= best) {
                            continue;
                        }

                        let id: String = sqlx::query_scalar(
                            r"
                            INSERT INTO personal_records (
                                id, owner_id, exercise_id, exercise_name, record_type, value,
                                workout_id, achieved_at, previous_value
                            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                            ON CONFLICT(owner_id, exercise_id, record_type) DO UPDATE SET
                                exercise_name = excluded.exercise_name,
                                value = excluded.value,
                                workout_id = excluded.workout_id,
                                achieved_at = excluded.achieved_at,
                                previous_value = excluded.previous_value
                            RETURNING id
                            ",
                        )
                        .bind(new_root_id())
                        .bind(owner_id)
                        .bind(exercise_id)
                        .bind(exercise_name)
                        .bind(record_type.as_str())
                        .bind(value)
                        .bind(workout_id)
                        .bind(achieved_at_text)
                        .bind(current)
                        .fetch_one(guard.executor()?)
                        .await?;

                        records.push(PersonalRecord {
                            id,
                            owner_id: owner_id.to_owned(),
                            exercise_id: exercise_id.to_owned(),
                            exercise_name: exercise_name.to_owned(),
                            record_type,
                            value,
                            workout_id: workout_id.to_owned(),
                            achieved_at,
                            previous_value: current,
                        });
                    }

                    guard.commit().await?;
                    Ok(records)
                }
            })
            .await?;

        for record in &records {
            info!(
                owner_id = %owner_id,
                exercise_id = %exercise_id,
                record_type = record.record_type.as_str(),
                value = record.value,
                previous = ?record.previous_value,
                "New personal record"
            );
        }
        Ok(records)
    }

    /// Most recently achieved records of an owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_recent(&self, owner_id: &str, limit: u32) -> AppResult<Vec<PersonalRecord>> {
        let query = format!(
            r"
            SELECT {RECORD_COLUMNS}
            FROM personal_records
            WHERE owner_id = $1
            ORDER BY achieved_at DESC, id DESC
            LIMIT $2
            "
        );

        let records = self
            .db
            .with_retry("Failed to list personal records", |pool| {
                let query = &query;
                async move {
                    let rows = sqlx::query(query)
                        .bind(owner_id)
                        .bind(i64::from(limit))
                        .fetch_all(&pool)
                        .await?;
                    rows.iter().map(row_to_record).collect::<AppResult<Vec<_>>>()
                }
            })
            .await?;

        debug!(owner_id = %owner_id, count = records.len(), "Listed recent personal records");
        Ok(records)
    }

    /// Current bests of an owner for one exercise, one per record type
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_for_exercise(
        &self,
        owner_id: &str,
        exercise_id: &str,
    ) -> AppResult<Vec<PersonalRecord>> {
        let query = format!(
            r"
            SELECT {RECORD_COLUMNS}
            FROM personal_records
            WHERE owner_id = $1 AND exercise_id = $2
            ORDER BY record_type ASC
            "
        );

        self.db
            .with_retry("Failed to list exercise records", |pool| {
                let query = &query;
                async move {
                    let rows = sqlx::query(query)
                        .bind(owner_id)
                        .bind(exercise_id)
                        .fetch_all(&pool)
                        .await?;
                    rows.iter().map(row_to_record).collect()
                }
            })
            .await
    }

    /// Record totals for an owner, including those set this calendar month (UTC)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn stats(&self, owner_id: &str) -> AppResult<RecordStats> {
        let month_start = format_timestamp(month_start(clock::now())?);

        self.db
            .with_retry("Failed to compute record stats", |pool| {
                let month_start = &month_start;
                async move {
                    let row = sqlx::query(
                        r"
                        SELECT
                            COUNT(*) AS total_records,
                            COALESCE(SUM(CASE WHEN achieved_at >= $2 THEN 1 ELSE 0 END), 0)
                                AS records_this_month
                        FROM personal_records
                        WHERE owner_id = $1
                        ",
                    )
                    .bind(owner_id)
                    .bind(month_start)
                    .fetch_one(&pool)
                    .await?;

                    Ok(RecordStats {
                        total_records: count_to_u64(row.try_get("total_records")?),
                        records_this_month: count_to_u64(row.try_get("records_this_month")?),
                    })
                }
            })
            .await
    }
}

/// Midnight UTC on the first day of `now`'s month
fn month_start(now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    now.date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| AppError::internal(format!("Cannot compute month start for {now}")))
}

fn row_to_record(row: &SqliteRow) -> AppResult<PersonalRecord> {
    let record_type: String = row.try_get("record_type")?;
    let achieved_at: String = row.try_get("achieved_at")?;

    Ok(PersonalRecord {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        exercise_id: row.try_get("exercise_id")?,
        exercise_name: row.try_get("exercise_name")?,
        record_type: RecordType::parse(&record_type),
        value: row.try_get("value")?,
        workout_id: row.try_get("workout_id")?,
        achieved_at: parse_timestamp(&achieved_at)?,
        previous_value: row.try_get("previous_value")?,
    })
}
