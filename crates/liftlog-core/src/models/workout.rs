// ABOUTME: Workout aggregate models: Workout, WorkoutExercise, WorkoutSet, WorkoutStatus
// ABOUTME: Status state machine, volume math, duplicate merging, and dense renumbering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::identifiers::{generate_child_id, new_root_id};

/// Lifecycle state of a workout
///
/// `planned → inProgress → completed`, and `planned | inProgress → cancelled`.
/// `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutStatus {
    /// Created but not started
    #[default]
    Planned,
    /// Started, sets are being logged
    InProgress,
    /// Finished
    Completed,
    /// Abandoned before completion
    Cancelled,
}

impl WorkoutStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from database string representation
    ///
    /// Unknown values default to `Planned`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "inProgress" | "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Planned,
        }
    }

    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `self → target` is an edge of the state machine
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Planned, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Planned | Self::InProgress, Self::Cancelled)
        )
    }
}

impl fmt::Display for WorkoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logged set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    /// Derived from the owning exercise row id and the set number
    #[serde(default)]
    pub id: String,
    /// Owning `WorkoutExercise` row id (assigned by the store)
    #[serde(default)]
    pub workout_exercise_id: String,
    /// Dense, 1-based position within the exercise
    pub set_number: u32,
    /// Load lifted, never negative
    pub weight: f64,
    /// Repetitions, at least one
    pub reps: u32,
    /// Whether the set was actually performed
    pub completed: bool,
}

impl WorkoutSet {
    /// Create a completed set; numbering is assigned on save
    #[must_use]
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            id: String::new(),
            workout_exercise_id: String::new(),
            set_number: 0,
            weight,
            reps,
            completed: true,
        }
    }

    /// Mark the set as not yet performed
    #[must_use]
    pub const fn pending(mut self) -> Self {
        self.completed = false;
        self
    }

    /// Weight × reps
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// An exercise performed within a workout, with a snapshot of catalog metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    /// Derived from the workout id and the exercise id
    #[serde(default)]
    pub id: String,
    /// Catalog exercise id (weak reference)
    pub exercise_id: String,
    /// Exercise name at the time it was added
    pub exercise_name: String,
    /// Body parts at the time it was added
    pub body_parts: Vec<String>,
    /// Equipment at the time it was added
    #[serde(default)]
    pub equipment: Option<String>,
    /// Dense, 0-based position within the workout
    pub order_index: u32,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Sets in order
    pub sets: Vec<WorkoutSet>,
}

impl WorkoutExercise {
    /// Create an exercise snapshot with no sets
    #[must_use]
    pub fn new(
        exercise_id: impl Into<String>,
        exercise_name: impl Into<String>,
        body_parts: Vec<String>,
    ) -> Self {
        Self {
            id: String::new(),
            exercise_id: exercise_id.into(),
            exercise_name: exercise_name.into(),
            body_parts,
            equipment: None,
            order_index: 0,
            notes: None,
            sets: Vec::new(),
        }
    }

    /// Append a completed set
    #[must_use]
    pub fn with_set(mut self, weight: f64, reps: u32) -> Self {
        self.sets.push(WorkoutSet::new(weight, reps));
        self
    }

    /// Sum of set volumes
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(WorkoutSet::volume).sum()
    }
}

/// Workout aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier; generated on save when empty
    pub id: String,
    /// Owning user
    pub owner_id: String,
    /// Display name
    pub name: String,
    /// Targeted body parts, in display order
    pub body_parts: Vec<String>,
    /// Planned duration in minutes
    pub planned_duration_minutes: u32,
    /// Lifecycle state
    pub status: WorkoutStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Stamped once on entering `inProgress`
    pub started_at: Option<DateTime<Utc>>,
    /// Stamped once on entering `completed`
    pub completed_at: Option<DateTime<Utc>>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Template this workout was instantiated from
    #[serde(default)]
    pub template_id: Option<String>,
    /// Exercises in order
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    /// Create a planned workout with a fresh id
    #[must_use]
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = clock::now();
        Self {
            id: new_root_id(),
            owner_id: owner_id.into(),
            name: name.into(),
            body_parts: Vec::new(),
            planned_duration_minutes: 0,
            status: WorkoutStatus::Planned,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
            notes: None,
            template_id: None,
            exercises: Vec::new(),
        }
    }

    /// Append an exercise
    #[must_use]
    pub fn with_exercise(mut self, exercise: WorkoutExercise) -> Self {
        self.exercises.push(exercise);
        self
    }

    /// Sum of all set volumes regardless of status
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(WorkoutExercise::volume).sum()
    }

    /// Number of sets across all exercises
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Elapsed time between start and completion, when both are stamped
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) if completed >= started => Some(completed - started),
            _ => None,
        }
    }
}

/// Merge exercises that share an exercise id into their first occurrence
///
/// The first occurrence keeps its position and snapshot; sets of later duplicates
/// are appended to it in list order. Set numbers are left for
/// [`assign_dense_order`] to rewrite.
#[must_use]
pub fn merge_duplicate_exercises(exercises: Vec<WorkoutExercise>) -> Vec<WorkoutExercise> {
    let mut merged: Vec<WorkoutExercise> = Vec::with_capacity(exercises.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for exercise in exercises {
        if let Some(&index) = positions.get(&exercise.exercise_id) {
            let target = &mut merged[index];
            target.sets.extend(exercise.sets);
            if target.notes.is_none() {
                target.notes = exercise.notes;
            }
        } else {
            positions.insert(exercise.exercise_id.clone(), merged.len());
            merged.push(exercise);
        }
    }

    merged
}

/// Rewrite order indices (0-based), set numbers (1-based), and child ids
///
/// Children are always regenerated from the parent id and their position, so the
/// stored tree never carries gaps or stale identities.
pub fn assign_dense_order(workout_id: &str, exercises: &mut [WorkoutExercise]) {
    for (index, exercise) in (0_u32..).zip(exercises.iter_mut()) {
        exercise.order_index = index;
        exercise.id = generate_child_id(workout_id, &exercise.exercise_id);
        for (number, set) in (1_u32..).zip(exercise.sets.iter_mut()) {
            set.set_number = number;
            set.workout_exercise_id.clone_from(&exercise.id);
            set.id = generate_child_id(&exercise.id, number);
        }
    }
}

/// Pre-save normalization: merge duplicates, then assign dense order and ids
#[must_use]
pub fn normalize_exercises(workout_id: &str, exercises: Vec<WorkoutExercise>) -> Vec<WorkoutExercise> {
    let mut normalized = merge_duplicate_exercises(exercises);
    assign_dense_order(workout_id, &mut normalized);
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench() -> WorkoutExercise {
        WorkoutExercise::new("bench", "Bench Press", vec!["chest".into(), "shoulders".into()])
    }

    #[test]
    fn test_status_state_machine() {
        use WorkoutStatus::{Cancelled, Completed, InProgress, Planned};

        assert!(Planned.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Planned.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!Planned.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Planned));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(Completed.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn test_status_round_trips_through_db_strings() {
        for status in [
            WorkoutStatus::Planned,
            WorkoutStatus::InProgress,
            WorkoutStatus::Completed,
            WorkoutStatus::Cancelled,
        ] {
            assert_eq!(WorkoutStatus::parse(status.as_str()), status);
        }
        assert_eq!(WorkoutStatus::parse("bogus"), WorkoutStatus::Planned);
    }

    #[test]
    fn test_volume_is_weight_times_reps() {
        let exercise = bench().with_set(80.0, 10).with_set(80.0, 8);
        assert!((exercise.volume() - 1440.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_merge_appends_sets_to_first_occurrence() {
        let squat = WorkoutExercise::new("squat", "Squat", vec!["legs".into()]).with_set(100.0, 5);
        let merged = merge_duplicate_exercises(vec![
            bench().with_set(60.0, 10),
            squat,
            bench().with_set(70.0, 8),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].exercise_id, "bench");
        assert_eq!(merged[0].sets.len(), 2);
        assert!((merged[0].sets[1].weight - 70.0).abs() < f64::EPSILON);
        assert_eq!(merged[1].exercise_id, "squat");
    }

    #[test]
    fn test_dense_order_after_removal() {
        let mut exercises = vec![
            bench().with_set(60.0, 10).with_set(60.0, 9).with_set(60.0, 8),
            WorkoutExercise::new("row", "Row", vec!["back".into()]).with_set(50.0, 12),
        ];
        exercises[0].sets.remove(1);
        exercises[0].sets[1].set_number = 3;

        let normalized = normalize_exercises("w1", exercises);

        assert_eq!(normalized[0].order_index, 0);
        assert_eq!(normalized[1].order_index, 1);
        let numbers: Vec<u32> = normalized[0].sets.iter().map(|s| s.set_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(normalized[0].id, "w1:bench");
        assert_eq!(normalized[0].sets[1].id, "w1:bench:2");
        assert_eq!(normalized[0].sets[1].workout_exercise_id, "w1:bench");
    }

    #[test]
    fn test_duration_requires_both_stamps() {
        let mut workout = Workout::new("u1", "Push");
        assert!(workout.duration().is_none());

        let start = Utc::now();
        workout.started_at = Some(start);
        workout.completed_at = Some(start + Duration::minutes(45));
        assert_eq!(workout.duration(), Some(Duration::minutes(45)));
    }
}
