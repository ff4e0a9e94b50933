// ABOUTME: Schema definition for the workout store: tables, constraints, and indices
// ABOUTME: Additive CREATE IF NOT EXISTS migration, destructive drop, and table presence check
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Schema
//!
//! Every statement here is idempotent, so `create_schema` runs on every open and
//! after every reinitialization. There is no versioned migration: new tables or
//! indices are added with `IF NOT EXISTS`.
//!
//! Child tables reference their parent with `ON DELETE CASCADE`, which is what
//! makes deleting a workout or template remove its whole subtree.

use std::collections::HashSet;

use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::constants::tables;
use crate::errors::{AppError, AppResult};

const CREATE_USERS: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

const CREATE_USER_PREFERENCES: &str = r"
CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    weight_unit TEXT NOT NULL DEFAULT 'kg',
    default_rest_seconds INTEGER NOT NULL DEFAULT 90 CHECK (default_rest_seconds >= 0),
    updated_at TEXT NOT NULL
)";

const CREATE_WORKOUTS: &str = r"
CREATE TABLE IF NOT EXISTS workouts (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL CHECK (length(owner_id) > 0),
    name TEXT NOT NULL,
    body_parts TEXT NOT NULL DEFAULT '[]',
    planned_duration_minutes INTEGER NOT NULL DEFAULT 0 CHECK (planned_duration_minutes >= 0),
    status TEXT NOT NULL DEFAULT 'planned'
        CHECK (status IN ('planned', 'inProgress', 'completed', 'cancelled')),
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    updated_at TEXT NOT NULL,
    notes TEXT,
    template_id TEXT
)";

const CREATE_WORKOUT_EXERCISES: &str = r"
CREATE TABLE IF NOT EXISTS workout_exercises (
    id TEXT PRIMARY KEY,
    workout_id TEXT NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    exercise_id TEXT NOT NULL,
    exercise_name TEXT NOT NULL,
    body_parts TEXT NOT NULL DEFAULT '[]',
    equipment TEXT,
    order_index INTEGER NOT NULL CHECK (order_index >= 0),
    notes TEXT,
    UNIQUE (workout_id, order_index),
    UNIQUE (workout_id, exercise_id)
)";

const CREATE_WORKOUT_SETS: &str = r"
CREATE TABLE IF NOT EXISTS workout_sets (
    id TEXT PRIMARY KEY,
    workout_exercise_id TEXT NOT NULL REFERENCES workout_exercises(id) ON DELETE CASCADE,
    set_number INTEGER NOT NULL CHECK (set_number >= 1),
    weight REAL NOT NULL CHECK (weight >= 0),
    reps INTEGER NOT NULL CHECK (reps >= 1),
    volume REAL NOT NULL,
    completed INTEGER NOT NULL DEFAULT 1,
    UNIQUE (workout_exercise_id, set_number)
)";

const CREATE_WORKOUT_TEMPLATES: &str = r"
CREATE TABLE IF NOT EXISTS workout_templates (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL CHECK (length(owner_id) > 0),
    name TEXT NOT NULL,
    description TEXT,
    body_parts TEXT NOT NULL DEFAULT '[]',
    estimated_duration_minutes INTEGER NOT NULL DEFAULT 0,
    difficulty TEXT NOT NULL DEFAULT 'beginner',
    category TEXT NOT NULL DEFAULT 'custom',
    is_favorite INTEGER NOT NULL DEFAULT 0,
    usage_count INTEGER NOT NULL DEFAULT 0,
    last_used_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

const CREATE_TEMPLATE_EXERCISES: &str = r"
CREATE TABLE IF NOT EXISTS template_exercises (
    id TEXT PRIMARY KEY,
    template_id TEXT NOT NULL REFERENCES workout_templates(id) ON DELETE CASCADE,
    exercise_id TEXT NOT NULL,
    exercise_name TEXT NOT NULL,
    body_parts TEXT NOT NULL DEFAULT '[]',
    order_index INTEGER NOT NULL CHECK (order_index >= 0),
    suggested_sets INTEGER NOT NULL CHECK (suggested_sets >= 1),
    rep_min INTEGER NOT NULL CHECK (rep_min >= 1),
    rep_max INTEGER NOT NULL,
    suggested_weight REAL,
    rest_seconds INTEGER NOT NULL DEFAULT 90,
    CHECK (rep_max >= rep_min),
    UNIQUE (template_id, order_index)
)";

const CREATE_PERSONAL_RECORDS: &str = r"
CREATE TABLE IF NOT EXISTS personal_records (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    exercise_id TEXT NOT NULL,
    exercise_name TEXT NOT NULL,
    record_type TEXT NOT NULL CHECK (record_type IN ('weight', 'volume', 'reps')),
    value REAL NOT NULL,
    workout_id TEXT NOT NULL,
    achieved_at TEXT NOT NULL,
    previous_value REAL,
    UNIQUE (owner_id, exercise_id, record_type)
)";

const CREATE_INDICES: [&str; 8] = [
    "CREATE INDEX IF NOT EXISTS idx_workouts_owner_created ON workouts(owner_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_workouts_owner_status ON workouts(owner_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_workout_exercises_workout ON workout_exercises(workout_id)",
    "CREATE INDEX IF NOT EXISTS idx_workout_sets_exercise ON workout_sets(workout_exercise_id)",
    "CREATE INDEX IF NOT EXISTS idx_templates_owner ON workout_templates(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_templates_last_used ON workout_templates(last_used_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_template_exercises_template ON template_exercises(template_id)",
    "CREATE INDEX IF NOT EXISTS idx_personal_records_owner_achieved ON personal_records(owner_id, achieved_at DESC)",
];

/// Table DDL, parents before children
const CREATE_TABLES: [&str; 8] = [
    CREATE_USERS,
    CREATE_USER_PREFERENCES,
    CREATE_WORKOUTS,
    CREATE_WORKOUT_EXERCISES,
    CREATE_WORKOUT_SETS,
    CREATE_WORKOUT_TEMPLATES,
    CREATE_TEMPLATE_EXERCISES,
    CREATE_PERSONAL_RECORDS,
];

/// Create every table and index that does not exist yet
///
/// # Errors
///
/// Returns an error if any DDL statement fails
pub async fn create_schema(pool: &SqlitePool) -> AppResult<()> {
    for statement in CREATE_TABLES.iter().chain(CREATE_INDICES.iter()) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| AppError::from(e).context_message("Failed to create schema"))?;
    }
    debug!(tables = CREATE_TABLES.len(), "Schema ensured");
    Ok(())
}

/// Drop every table owned by the engine, children first
///
/// # Errors
///
/// Returns an error if a `DROP` statement fails
pub async fn drop_schema(pool: &SqlitePool) -> AppResult<()> {
    for table in tables::ALL.iter().rev() {
        let statement = format!("DROP TABLE IF EXISTS {table}");
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| AppError::from(e).context_message("Failed to drop schema"))?;
    }
    info!("All tables dropped");
    Ok(())
}

/// Expected tables that are absent from the database, in creation order
///
/// # Errors
///
/// Returns an error if the catalog query fails
pub async fn missing_tables(pool: &SqlitePool) -> AppResult<Vec<String>> {
    let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::from(e).context_message("Failed to inspect schema"))?;

    let present = rows
        .iter()
        .map(|row| row.try_get::<String, _>("name"))
        .collect::<Result<HashSet<_>, _>>()?;

    Ok(tables::ALL
        .iter()
        .filter(|table| !present.contains(**table))
        .map(|table| (*table).to_owned())
        .collect())
}
