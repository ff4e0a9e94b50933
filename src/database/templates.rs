// ABOUTME: Workout template persistence with favorites, usage tracking, and built-in templates
// ABOUTME: System-owned templates are readable by everyone and rejected by every editing operation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{debug, info, warn};

use super::mappers::{
    decode_string_list, encode_string_list, format_optional_timestamp, format_timestamp,
    parse_optional_timestamp, parse_timestamp, to_u32,
};
use super::transactions::SqliteTransactionGuard;
use super::validation::{validate_template, validate_workout};
use super::workouts::{insert_exercises as insert_workout_exercises, insert_header};
use super::Database;
use crate::clock;
use crate::constants::ids::SYSTEM_OWNER_ID;
use crate::errors::{AppError, AppResult};
use crate::identifiers::new_root_id;
use crate::models::{
    assign_template_order, normalize_exercises, Difficulty, RepRange, TemplateCategory,
    TemplateExercise, Workout, WorkoutTemplate,
};

const TEMPLATE_COLUMNS: &str = r"
    id, owner_id, name, description, body_parts, estimated_duration_minutes,
    difficulty, category, is_favorite, usage_count, last_used_at, created_at, updated_at
";

/// Template persistence backed by [`Database`]
#[derive(Clone)]
pub struct TemplatesManager {
    db: Database,
}

impl TemplatesManager {
    /// Create a new templates manager
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new user template and return its id
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when the owner is the system owner, or a validation
    /// or storage error
    pub async fn save(&self, template: &WorkoutTemplate) -> AppResult<String> {
        validate_template(template)?;
        if template.is_system() {
            return Err(AppError::forbidden("System templates cannot be created by users"));
        }

        let id = if template.id.trim().is_empty() {
            new_root_id()
        } else {
            template.id.clone()
        };
        let mut normalized = WorkoutTemplate {
            id: id.clone(),
            ..template.clone()
        };
        assign_template_order(&id, &mut normalized.exercises);

        self.db
            .with_retry("Failed to save template", |pool| {
                let normalized = &normalized;
                async move {
                    let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                    insert_template(guard.executor()?, normalized).await?;
                    guard.commit().await
                }
            })
            .await
            .map_err(|e| e.with_resource_id(&id))?;

        info!(
            template_id = %id,
            owner_id = %template.owner_id,
            exercises = normalized.exercises.len(),
            "Template saved"
        );
        Ok(id)
    }

    /// Replace a template's descriptive fields and its exercise list
    ///
    /// Favorite flag and usage tracking are left as stored.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent, `Forbidden` for system templates,
    /// or a validation or storage error
    pub async fn update(&self, template: &WorkoutTemplate) -> AppResult<()> {
        validate_template(template)?;
        let mut exercises = template.exercises.clone();
        assign_template_order(&template.id, &mut exercises);
        let body_parts = encode_string_list(&template.body_parts)?;
        let updated_at = format_timestamp(clock::now());

        self.db
            .with_retry("Failed to update template", |pool| {
                let (exercises, body_parts, updated_at) = (&exercises, &body_parts, &updated_at);
                async move {
                    let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                    ensure_editable(guard.executor()?, &template.id).await?;

                    sqlx::query(
                        r"
                        UPDATE workout_templates
                        SET name = $1, description = $2, body_parts = $3,
                            estimated_duration_minutes = $4, difficulty = $5, category = $6,
                            updated_at = $7
                        WHERE id = $8
                        ",
                    )
                    .bind(&template.name)
                    .bind(&template.description)
                    .bind(body_parts)
                    .bind(i64::from(template.estimated_duration_minutes))
                    .bind(template.difficulty.as_str())
                    .bind(template.category.as_str())
                    .bind(updated_at)
                    .bind(&template.id)
                    .execute(guard.executor()?)
                    .await?;

                    sqlx::query("DELETE FROM template_exercises WHERE template_id = $1")
                        .bind(&template.id)
                        .execute(guard.executor()?)
                        .await?;
                    insert_template_exercises(guard.executor()?, &template.id, exercises).await?;

                    guard.commit().await
                }
            })
            .await
            .map_err(|e| e.with_resource_id(&template.id))?;

        info!(template_id = %template.id, exercises = exercises.len(), "Template updated");
        Ok(())
    }

    /// Load a template with its exercises
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed
    pub async fn get(&self, template_id: &str) -> AppResult<Option<WorkoutTemplate>> {
        let template = self
            .db
            .with_retry("Failed to get template", |pool| async move {
                let mut guard = SqliteTransactionGuard::begin(&pool).await?;
                let template = fetch_template(guard.executor()?, template_id).await?;
                guard.commit().await?;
                Ok(template)
            })
            .await?;

        debug!(template_id = %template_id, found = template.is_some(), "Template lookup");
        Ok(template)
    }

    /// Delete a user template and its exercises
    ///
    /// Returns whether a template was removed.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for system templates or a storage error
    pub async fn delete(&self, template_id: &str) -> AppResult<bool> {
        let removed = self
            .db
            .with_retry("Failed to delete template", |pool| async move {
                let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                if owner_of(guard.executor()?, template_id).await?.is_none() {
                    guard.rollback().await?;
                    return Ok(false);
                }
                ensure_editable(guard.executor()?, template_id).await?;

                let result = sqlx::query("DELETE FROM workout_templates WHERE id = $1")
                    .bind(template_id)
                    .execute(guard.executor()?)
                    .await?;
                guard.commit().await?;
                Ok(result.rows_affected() > 0)
            })
            .await
            .map_err(|e| e.with_resource_id(template_id))?;

        if removed {
            info!(template_id = %template_id, "Template deleted");
        }
        Ok(removed)
    }

    /// Templates visible to `owner_id`: their own plus the system templates
    ///
    /// Favorites first, then by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(
        &self,
        owner_id: &str,
        category: Option<TemplateCategory>,
    ) -> AppResult<Vec<WorkoutTemplate>> {
        let category = category.map(|c| c.as_str());
        let query = format!(
            r"
            SELECT {TEMPLATE_COLUMNS}
            FROM workout_templates
            WHERE owner_id IN ($1, $2) AND ($3 IS NULL OR category = $3)
            ORDER BY is_favorite DESC, name ASC, id ASC
            "
        );

        let templates = self
            .db
            .with_retry("Failed to list templates", |pool| {
                let query = &query;
                async move {
                    let mut guard = SqliteTransactionGuard::begin(&pool).await?;
                    let rows = sqlx::query(query)
                        .bind(owner_id)
                        .bind(SYSTEM_OWNER_ID)
                        .bind(category)
                        .fetch_all(guard.executor()?)
                        .await?;
                    let templates = load_templates(guard.executor()?, &rows).await?;
                    guard.commit().await?;
                    Ok(templates)
                }
            })
            .await?;

        debug!(owner_id = %owner_id, ?category, count = templates.len(), "Listed templates");
        Ok(templates)
    }

    /// Most recently used templates visible to `owner_id`, never-used excluded
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_recent(&self, owner_id: &str, limit: u32) -> AppResult<Vec<WorkoutTemplate>> {
        let query = format!(
            r"
            SELECT {TEMPLATE_COLUMNS}
            FROM workout_templates
            WHERE owner_id IN ($1, $2) AND last_used_at IS NOT NULL
            ORDER BY last_used_at DESC, id DESC
            LIMIT $3
            "
        );

        self.db
            .with_retry("Failed to list recent templates", |pool| {
                let query = &query;
                async move {
                    let mut guard = SqliteTransactionGuard::begin(&pool).await?;
                    let rows = sqlx::query(query)
                        .bind(owner_id)
                        .bind(SYSTEM_OWNER_ID)
                        .bind(i64::from(limit))
                        .fetch_all(guard.executor()?)
                        .await?;
                    let templates = load_templates(guard.executor()?, &rows).await?;
                    guard.commit().await?;
                    Ok(templates)
                }
            })
            .await
    }

    /// Flip a template's favorite flag and return the new value
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if absent or `Forbidden` for system templates
    pub async fn toggle_favorite(&self, template_id: &str) -> AppResult<bool> {
        let favorite = self
            .db
            .with_retry("Failed to toggle favorite", |pool| async move {
                let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                ensure_editable(guard.executor()?, template_id).await?;

                let favorite: bool = sqlx::query_scalar(
                    r"
                    UPDATE workout_templates
                    SET is_favorite = 1 - is_favorite, updated_at = $1
                    WHERE id = $2
                    RETURNING is_favorite
                    ",
                )
                .bind(format_timestamp(clock::now()))
                .bind(template_id)
                .fetch_one(guard.executor()?)
                .await?;

                guard.commit().await?;
                Ok(favorite)
            })
            .await
            .map_err(|e| e.with_resource_id(template_id))?;

        info!(template_id = %template_id, favorite, "Template favorite toggled");
        Ok(favorite)
    }

    /// Increment the usage counter and stamp the last-used time
    ///
    /// Allowed on system templates. Returns the new usage count.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the template does not exist
    pub async fn record_usage(&self, template_id: &str) -> AppResult<u32> {
        let usage_count = self
            .db
            .with_retry("Failed to record template usage", |pool| async move {
                let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                let count = bump_usage(guard.executor()?, template_id).await?;
                guard.commit().await?;
                Ok(count)
            })
            .await
            .map_err(|e| e.with_resource_id(template_id))?;

        debug!(template_id = %template_id, usage_count, "Template usage recorded");
        Ok(usage_count)
    }

    /// Create a planned workout for `owner_id` from a template
    ///
    /// The workout is saved and the template's usage recorded in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the template does not exist, or a
    /// validation or storage error
    pub async fn instantiate(&self, template_id: &str, owner_id: &str) -> AppResult<Workout> {
        let template = self
            .get(template_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Template {template_id}")).with_resource_id(template_id)
            })?;

        let mut workout = template.instantiate(owner_id);
        validate_workout(&workout)?;
        workout.exercises = normalize_exercises(&workout.id, workout.exercises);

        self.db
            .with_retry("Failed to instantiate template", |pool| {
                let workout = &workout;
                async move {
                    let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                    insert_header(guard.executor()?, workout).await?;
                    insert_workout_exercises(guard.executor()?, &workout.id, &workout.exercises)
                        .await?;
                    bump_usage(guard.executor()?, template_id).await?;
                    guard.commit().await
                }
            })
            .await?;

        info!(
            template_id = %template_id,
            workout_id = %workout.id,
            owner_id = %owner_id,
            "Workout instantiated from template"
        );
        Ok(workout)
    }

    /// Insert the built-in templates that are not present yet
    ///
    /// Ids are fixed, so running this on every startup is safe. Returns how
    /// many templates were inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails
    pub async fn seed_system_templates(&self) -> AppResult<usize> {
        let templates = system_templates();

        let inserted = self
            .db
            .with_retry("Failed to seed system templates", |pool| {
                let templates = &templates;
                async move {
                    let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
                    let mut inserted = 0;
                    for template in templates {
                        if owner_of(guard.executor()?, &template.id).await?.is_some() {
                            continue;
                        }
                        insert_template(guard.executor()?, template).await?;
                        inserted += 1;
                    }
                    guard.commit().await?;
                    Ok(inserted)
                }
            })
            .await?;

        if inserted > 0 {
            info!(inserted, "System templates seeded");
        }
        Ok(inserted)
    }
}

async fn owner_of(conn: &mut SqliteConnection, template_id: &str) -> AppResult<Option<String>> {
    Ok(
        sqlx::query_scalar("SELECT owner_id FROM workout_templates WHERE id = $1")
            .bind(template_id)
            .fetch_optional(conn)
            .await?,
    )
}

/// Fail unless the template exists and is user-owned
async fn ensure_editable(conn: &mut SqliteConnection, template_id: &str) -> AppResult<()> {
    match owner_of(conn, template_id).await? {
        None => Err(AppError::not_found(format!("Template {template_id}"))),
        Some(owner) if owner == SYSTEM_OWNER_ID => {
            warn!(template_id = %template_id, "Rejected edit of system template");
            Err(AppError::forbidden(format!(
                "Template {template_id} is a system template and cannot be modified"
            )))
        }
        Some(_) => Ok(()),
    }
}

async fn bump_usage(conn: &mut SqliteConnection, template_id: &str) -> AppResult<u32> {
    let count: Option<i64> = sqlx::query_scalar(
        r"
        UPDATE workout_templates
        SET usage_count = usage_count + 1, last_used_at = $1
        WHERE id = $2
        RETURNING usage_count
        ",
    )
    .bind(format_timestamp(clock::now()))
    .bind(template_id)
    .fetch_optional(conn)
    .await?;

    let count = count.ok_or_else(|| AppError::not_found(format!("Template {template_id}")))?;
    to_u32(count, "usage_count")
}

async fn insert_template(conn: &mut SqliteConnection, template: &WorkoutTemplate) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO workout_templates (
            id, owner_id, name, description, body_parts, estimated_duration_minutes,
            difficulty, category, is_favorite, usage_count, last_used_at, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ",
    )
    .bind(&template.id)
    .bind(&template.owner_id)
    .bind(&template.name)
    .bind(&template.description)
    .bind(encode_string_list(&template.body_parts)?)
    .bind(i64::from(template.estimated_duration_minutes))
    .bind(template.difficulty.as_str())
    .bind(template.category.as_str())
    .bind(template.is_favorite)
    .bind(i64::from(template.usage_count))
    .bind(format_optional_timestamp(template.last_used_at))
    .bind(format_timestamp(template.created_at))
    .bind(format_timestamp(template.updated_at))
    .execute(&mut *conn)
    .await?;

    insert_template_exercises(conn, &template.id, &template.exercises).await
}

async fn insert_template_exercises(
    conn: &mut SqliteConnection,
    template_id: &str,
    exercises: &[TemplateExercise],
) -> AppResult<()> {
    for exercise in exercises {
        sqlx::query(
            r"
            INSERT INTO template_exercises (
                id, template_id, exercise_id, exercise_name, body_parts, order_index,
                suggested_sets, rep_min, rep_max, suggested_weight, rest_seconds
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(&exercise.id)
        .bind(template_id)
        .bind(&exercise.exercise_id)
        .bind(&exercise.exercise_name)
        .bind(encode_string_list(&exercise.body_parts)?)
        .bind(i64::from(exercise.order_index))
        .bind(i64::from(exercise.suggested_sets))
        .bind(i64::from(exercise.suggested_reps.min))
        .bind(i64::from(exercise.suggested_reps.max))
        .bind(exercise.suggested_weight)
        .bind(i64::from(exercise.rest_seconds))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_template(
    conn: &mut SqliteConnection,
    template_id: &str,
) -> AppResult<Option<WorkoutTemplate>> {
    let query = format!("SELECT {TEMPLATE_COLUMNS} FROM workout_templates WHERE id = $1");
    let Some(row) = sqlx::query(&query)
        .bind(template_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let mut template = row_to_template(&row)?;
    template.exercises = load_template_exercises(conn, template_id).await?;
    Ok(Some(template))
}

async fn load_template_exercises(
    conn: &mut SqliteConnection,
    template_id: &str,
) -> AppResult<Vec<TemplateExercise>> {
    let rows = sqlx::query(
        r"
        SELECT id, exercise_id, exercise_name, body_parts, order_index, suggested_sets,
               rep_min, rep_max, suggested_weight, rest_seconds
        FROM template_exercises
        WHERE template_id = $1
        ORDER BY order_index ASC
        ",
    )
    .bind(template_id)
    .fetch_all(conn)
    .await?;

    rows.iter().map(row_to_template_exercise).collect()
}

async fn load_templates(
    conn: &mut SqliteConnection,
    rows: &[SqliteRow],
) -> AppResult<Vec<WorkoutTemplate>> {
    let mut templates = Vec::with_capacity(rows.len());
    for row in rows {
        let mut template = row_to_template(row)?;
        template.exercises = load_template_exercises(&mut *conn, &template.id).await?;
        templates.push(template);
    }
    Ok(templates)
}

/// Built-in templates owned by the system owner, with fixed ids
fn system_templates() -> Vec<WorkoutTemplate> {
    let exercise = |id: &str, name: &str, parts: &[&str], sets, min, max| {
        TemplateExercise::new(
            id,
            name,
            parts.iter().map(|p| (*p).to_owned()).collect(),
            sets,
            RepRange::new(min, max),
        )
    };

    let mut full_body = WorkoutTemplate::new(SYSTEM_OWNER_ID, "Full Body Basics")
        .with_exercise(exercise("squat", "Barbell Squat", &["legs", "glutes"], 3, 8, 10))
        .with_exercise(exercise("bench-press", "Bench Press", &["chest", "triceps"], 3, 8, 10))
        .with_exercise(exercise("barbell-row", "Barbell Row", &["back", "biceps"], 3, 8, 10));
    full_body.id = "system-full-body-basics".to_owned();
    full_body.description = Some("Three compound lifts covering the whole body".to_owned());
    full_body.body_parts = vec!["legs".into(), "chest".into(), "back".into()];
    full_body.estimated_duration_minutes = 45;
    full_body.category = TemplateCategory::Strength;

    let mut push = WorkoutTemplate::new(SYSTEM_OWNER_ID, "Push Day")
        .with_exercise(exercise("bench-press", "Bench Press", &["chest", "triceps"], 4, 6, 8))
        .with_exercise(exercise("overhead-press", "Overhead Press", &["shoulders", "triceps"], 3, 8, 10))
        .with_exercise(exercise("triceps-pushdown", "Triceps Pushdown", &["triceps"], 3, 10, 12));
    push.id = "system-push-day".to_owned();
    push.description = Some("Chest, shoulders, and triceps".to_owned());
    push.body_parts = vec!["chest".into(), "shoulders".into(), "triceps".into()];
    push.estimated_duration_minutes = 60;
    push.difficulty = Difficulty::Intermediate;
    push.category = TemplateCategory::Hypertrophy;

    let mut bodyweight = WorkoutTemplate::new(SYSTEM_OWNER_ID, "Bodyweight Circuit")
        .with_exercise(exercise("push-up", "Push-Up", &["chest", "triceps"], 3, 10, 20))
        .with_exercise(exercise("pull-up", "Pull-Up", &["back", "biceps"], 3, 5, 10))
        .with_exercise(exercise("lunge", "Walking Lunge", &["legs", "glutes"], 3, 12, 16));
    bodyweight.id = "system-bodyweight-circuit".to_owned();
    bodyweight.body_parts = vec!["chest".into(), "back".into(), "legs".into()];
    bodyweight.estimated_duration_minutes = 30;
    bodyweight.category = TemplateCategory::Bodyweight;

    let mut templates = vec![full_body, push, bodyweight];
    for template in &mut templates {
        assign_template_order(&template.id, &mut template.exercises);
    }
    templates
}

fn row_to_template(row: &SqliteRow) -> AppResult<WorkoutTemplate> {
    let body_parts: String = row.try_get("body_parts")?;
    let duration: i64 = row.try_get("estimated_duration_minutes")?;
    let difficulty: String = row.try_get("difficulty")?;
    let category: String = row.try_get("category")?;
    let usage_count: i64 = row.try_get("usage_count")?;
    let last_used_at: Option<String> = row.try_get("last_used_at")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(WorkoutTemplate {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        body_parts: decode_string_list(&body_parts)?,
        estimated_duration_minutes: to_u32(duration, "estimated_duration_minutes")?,
        difficulty: Difficulty::parse(&difficulty),
        category: TemplateCategory::parse(&category),
        is_favorite: row.try_get("is_favorite")?,
        usage_count: to_u32(usage_count, "usage_count")?,
        last_used_at: parse_optional_timestamp(last_used_at.as_deref())?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        exercises: Vec::new(),
    })
}

fn row_to_template_exercise(row: &SqliteRow) -> AppResult<TemplateExercise> {
    let body_parts: String = row.try_get("body_parts")?;
    let order_index: i64 = row.try_get("order_index")?;
    let suggested_sets: i64 = row.try_get("suggested_sets")?;
    let rep_min: i64 = row.try_get("rep_min")?;
    let rep_max: i64 = row.try_get("rep_max")?;
    let rest_seconds: i64 = row.try_get("rest_seconds")?;

    Ok(TemplateExercise {
        id: row.try_get("id")?,
        exercise_id: row.try_get("exercise_id")?,
        exercise_name: row.try_get("exercise_name")?,
        body_parts: decode_string_list(&body_parts)?,
        order_index: to_u32(order_index, "order_index")?,
        suggested_sets: to_u32(suggested_sets, "suggested_sets")?,
        suggested_reps: RepRange::new(to_u32(rep_min, "rep_min")?, to_u32(rep_max, "rep_max")?),
        suggested_weight: row.try_get("suggested_weight")?,
        rest_seconds: to_u32(rest_seconds, "rest_seconds")?,
    })
}
