// ABOUTME: Input validation for aggregates before they reach storage
// ABOUTME: Missing required fields are constraint violations; malformed values are invalid input
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! Input validation shared by the workout and template stores
//!
//! Validation never fills in defaults for missing required fields; an absent
//! owner id is surfaced as `ConstraintViolation` rather than silently replaced.

use crate::constants::ids::CHILD_ID_SEPARATOR;
use crate::errors::{AppError, AppResult};
use crate::models::{
    TemplateExercise, Workout, WorkoutExercise, WorkoutSet, WorkoutStatus, WorkoutTemplate,
};

/// Require a non-blank string field
///
/// # Errors
///
/// Returns `ConstraintViolation` naming the field if it is empty or whitespace
pub fn require_field(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::constraint_violation(format!("{field} is required")));
    }
    Ok(())
}

/// Reject an id that child ids are derived from if it contains the separator
///
/// `generate_child_id` joins parent and key with the separator, so a separator
/// inside either part could make two different children share one id.
///
/// # Errors
///
/// Returns `InvalidInput` naming the field
pub fn validate_id_segment(value: &str, field: &str) -> AppResult<()> {
    if value.contains(CHILD_ID_SEPARATOR) {
        return Err(AppError::invalid_input(format!(
            "{field} must not contain '{CHILD_ID_SEPARATOR}', got {value:?}"
        )));
    }
    Ok(())
}

/// Validate a single set
///
/// # Errors
///
/// Returns `InvalidInput` for a negative or non-finite weight or zero reps
pub fn validate_set(set: &WorkoutSet) -> AppResult<()> {
    if !set.weight.is_finite() || set.weight < 0.0 {
        return Err(AppError::invalid_input(format!(
            "weight must be a non-negative number, got {}",
            set.weight
        )));
    }
    if set.reps == 0 {
        return Err(AppError::invalid_input("reps must be at least 1"));
    }
    Ok(())
}

fn validate_workout_exercise(exercise: &WorkoutExercise) -> AppResult<()> {
    require_field(&exercise.exercise_id, "exercise_id")?;
    validate_id_segment(&exercise.exercise_id, "exercise_id")?;
    require_field(&exercise.exercise_name, "exercise_name")?;
    exercise.sets.iter().try_for_each(validate_set)
}

/// Validate a workout aggregate before save or update
///
/// # Errors
///
/// Returns `ConstraintViolation` for missing required fields and
/// `InvalidInput` for malformed ids or sets
pub fn validate_workout(workout: &Workout) -> AppResult<()> {
    require_field(&workout.owner_id, "owner_id")?;
    require_field(&workout.name, "name")?;
    validate_id_segment(&workout.id, "workout id")?;
    workout
        .exercises
        .iter()
        .try_for_each(validate_workout_exercise)
}

/// Check that the lifecycle stamps agree with the status of a new workout
///
/// `started_at` exists from `inProgress` on and `completed_at` only once
/// `completed`. Transitions stamp them later, so a stored status must
/// never get ahead of its stamps.
///
/// # Errors
///
/// Returns `InvalidInput` describing the mismatch
pub fn validate_lifecycle(workout: &Workout) -> AppResult<()> {
    let status = workout.status;
    match (status, workout.started_at, workout.completed_at) {
        (WorkoutStatus::Planned, None, None)
        | (WorkoutStatus::InProgress, Some(_), None)
        | (WorkoutStatus::Cancelled, _, None) => Ok(()),
        (WorkoutStatus::Completed, Some(started), Some(completed)) => {
            if completed < started {
                return Err(AppError::invalid_input(format!(
                    "completed_at {completed} is before started_at {started}"
                )));
            }
            Ok(())
        }
        (_, started, completed) => Err(AppError::invalid_input(format!(
            "status {status} does not match started_at {} and completed_at {}",
            if started.is_some() { "set" } else { "unset" },
            if completed.is_some() { "set" } else { "unset" },
        ))),
    }
}

fn validate_template_exercise(exercise: &TemplateExercise) -> AppResult<()> {
    require_field(&exercise.exercise_id, "exercise_id")?;
    require_field(&exercise.exercise_name, "exercise_name")?;
    if exercise.suggested_sets == 0 {
        return Err(AppError::invalid_input("suggested_sets must be at least 1"));
    }
    let reps = exercise.suggested_reps;
    if reps.min == 0 || reps.max < reps.min {
        return Err(AppError::invalid_input(format!(
            "suggested rep range [{}, {}] is invalid",
            reps.min, reps.max
        )));
    }
    if let Some(weight) = exercise.suggested_weight {
        if !weight.is_finite() || weight < 0.0 {
            return Err(AppError::invalid_input(
                "suggested_weight must be a non-negative number",
            ));
        }
    }
    Ok(())
}

/// Validate a template aggregate before save or update
///
/// # Errors
///
/// Returns `ConstraintViolation` for missing required fields and
/// `InvalidInput` for malformed suggestions
pub fn validate_template(template: &WorkoutTemplate) -> AppResult<()> {
    require_field(&template.owner_id, "owner_id")?;
    require_field(&template.name, "name")?;
    template
        .exercises
        .iter()
        .try_for_each(validate_template_exercise)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::RepRange;

    #[test]
    fn test_missing_owner_is_constraint_violation() {
        let workout = Workout::new("", "Push");
        let error = validate_workout(&workout).unwrap_err();
        assert_eq!(error.code, ErrorCode::ConstraintViolation);
        assert!(error.message.contains("owner_id"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let workout = Workout::new("u1", "Push").with_exercise(
            WorkoutExercise::new("bench", "Bench Press", vec![]).with_set(-5.0, 10),
        );
        assert_eq!(
            validate_workout(&workout).unwrap_err().code,
            ErrorCode::InvalidInput
        );
    }

    #[test]
    fn test_separator_in_ids_rejected() {
        let workout = Workout::new("u1", "Push")
            .with_exercise(WorkoutExercise::new("b:c", "Bench Press", vec![]).with_set(60.0, 5));
        assert_eq!(
            validate_workout(&workout).unwrap_err().code,
            ErrorCode::InvalidInput
        );

        let mut workout = Workout::new("u1", "Push");
        workout.id = "a:b".to_owned();
        assert_eq!(
            validate_workout(&workout).unwrap_err().code,
            ErrorCode::InvalidInput
        );
    }

    #[test]
    fn test_lifecycle_stamps_must_match_status() {
        let now = Utc::now();
        let mut workout = Workout::new("u1", "Push");
        assert!(validate_lifecycle(&workout).is_ok());

        workout.status = WorkoutStatus::Completed;
        assert_eq!(
            validate_lifecycle(&workout).unwrap_err().code,
            ErrorCode::InvalidInput
        );

        workout.started_at = Some(now);
        workout.completed_at = Some(now - Duration::minutes(5));
        assert!(validate_lifecycle(&workout).is_err());

        workout.completed_at = Some(now + Duration::minutes(45));
        assert!(validate_lifecycle(&workout).is_ok());

        workout.status = WorkoutStatus::InProgress;
        assert!(validate_lifecycle(&workout).is_err());
        workout.completed_at = None;
        assert!(validate_lifecycle(&workout).is_ok());

        workout.status = WorkoutStatus::Planned;
        assert!(validate_lifecycle(&workout).is_err());

        workout.status = WorkoutStatus::Cancelled;
        assert!(validate_lifecycle(&workout).is_ok());
    }

    #[test]
    fn test_zero_reps_rejected() {
        assert!(validate_set(&WorkoutSet::new(20.0, 0)).is_err());
        assert!(validate_set(&WorkoutSet::new(0.0, 1)).is_ok());
    }

    #[test]
    fn test_inverted_rep_range_rejected() {
        let template = WorkoutTemplate::new("u1", "Legs").with_exercise(TemplateExercise::new(
            "squat",
            "Squat",
            vec!["legs".into()],
            3,
            RepRange::new(10, 5),
        ));
        assert_eq!(
            validate_template(&template).unwrap_err().code,
            ErrorCode::InvalidInput
        );
    }
}
