// ABOUTME: Workout template aggregate: WorkoutTemplate, TemplateExercise, difficulty and category
// ABOUTME: Instantiation of a planned Workout from a template
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::workout::{Workout, WorkoutExercise};
use crate::clock;
use crate::constants::{defaults, ids};
use crate::identifiers::{generate_child_id, new_root_id};

/// How demanding a template is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Suitable for new lifters
    #[default]
    Beginner,
    /// Requires some training history
    Intermediate,
    /// High volume or technical lifts
    Advanced,
}

impl Difficulty {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            _ => Self::Beginner,
        }
    }
}

/// Template category for organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    /// Low-rep heavy work
    Strength,
    /// Moderate-rep muscle building
    Hypertrophy,
    /// High-rep conditioning
    Endurance,
    /// No external load
    Bodyweight,
    /// User-defined
    #[default]
    Custom,
}

impl TemplateCategory {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Hypertrophy => "hypertrophy",
            Self::Endurance => "endurance",
            Self::Bodyweight => "bodyweight",
            Self::Custom => "custom",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "strength" => Self::Strength,
            "hypertrophy" => Self::Hypertrophy,
            "endurance" => Self::Endurance,
            "bodyweight" => Self::Bodyweight,
            _ => Self::Custom,
        }
    }
}

/// Suggested repetitions, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRange {
    /// Lower bound, at least one
    pub min: u32,
    /// Upper bound, at least `min`
    pub max: u32,
}

impl RepRange {
    /// Create a range
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// One planned exercise inside a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExercise {
    /// Derived from the template id and the order index
    #[serde(default)]
    pub id: String,
    /// Catalog exercise id (weak reference)
    pub exercise_id: String,
    /// Exercise name at the time it was added
    pub exercise_name: String,
    /// Body parts at the time it was added
    pub body_parts: Vec<String>,
    /// Dense, 0-based position within the template
    pub order_index: u32,
    /// Suggested number of sets
    pub suggested_sets: u32,
    /// Suggested rep range
    pub suggested_reps: RepRange,
    /// Suggested working weight
    pub suggested_weight: Option<f64>,
    /// Rest between sets
    pub rest_seconds: u32,
}

impl TemplateExercise {
    /// Create a template exercise snapshot
    #[must_use]
    pub fn new(
        exercise_id: impl Into<String>,
        exercise_name: impl Into<String>,
        body_parts: Vec<String>,
        suggested_sets: u32,
        suggested_reps: RepRange,
    ) -> Self {
        Self {
            id: String::new(),
            exercise_id: exercise_id.into(),
            exercise_name: exercise_name.into(),
            body_parts,
            order_index: 0,
            suggested_sets,
            suggested_reps,
            suggested_weight: None,
            rest_seconds: defaults::REST_SECONDS,
        }
    }
}

/// Workout template aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    /// Unique identifier; generated on save when empty
    pub id: String,
    /// Owning user, or the system sentinel for built-in templates
    pub owner_id: String,
    /// Display name
    pub name: String,
    /// Longer description
    pub description: Option<String>,
    /// Targeted body parts
    pub body_parts: Vec<String>,
    /// Estimated duration in minutes
    pub estimated_duration_minutes: u32,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Category
    pub category: TemplateCategory,
    /// Whether the owner starred this template
    pub is_favorite: bool,
    /// Number of workouts instantiated from this template
    pub usage_count: u32,
    /// Last instantiation
    pub last_used_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
    /// Exercises in order
    pub exercises: Vec<TemplateExercise>,
}

impl WorkoutTemplate {
    /// Create an empty template with a fresh id
    #[must_use]
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = clock::now();
        Self {
            id: new_root_id(),
            owner_id: owner_id.into(),
            name: name.into(),
            description: None,
            body_parts: Vec::new(),
            estimated_duration_minutes: 0,
            difficulty: Difficulty::default(),
            category: TemplateCategory::default(),
            is_favorite: false,
            usage_count: 0,
            last_used_at: None,
            created_at: now,
            updated_at: now,
            exercises: Vec::new(),
        }
    }

    /// Append an exercise
    #[must_use]
    pub fn with_exercise(mut self, exercise: TemplateExercise) -> Self {
        self.exercises.push(exercise);
        self
    }

    /// Whether this is a built-in template owned by the system sentinel
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.owner_id == ids::SYSTEM_OWNER_ID
    }

    /// Build a planned workout for `owner_id` with one empty exercise per template exercise
    #[must_use]
    pub fn instantiate(&self, owner_id: &str) -> Workout {
        let mut workout = Workout::new(owner_id, self.name.clone());
        workout.body_parts.clone_from(&self.body_parts);
        workout.planned_duration_minutes = if self.estimated_duration_minutes == 0 {
            defaults::PLANNED_DURATION_MINUTES
        } else {
            self.estimated_duration_minutes
        };
        workout.template_id = Some(self.id.clone());
        workout.exercises = self
            .exercises
            .iter()
            .map(|exercise| {
                let mut copy = WorkoutExercise::new(
                    exercise.exercise_id.clone(),
                    exercise.exercise_name.clone(),
                    exercise.body_parts.clone(),
                );
                copy.order_index = exercise.order_index;
                copy
            })
            .collect();
        workout
    }
}

/// Assign dense order indices and derived ids to template exercises
pub fn assign_template_order(template_id: &str, exercises: &mut [TemplateExercise]) {
    for (index, exercise) in (0_u32..).zip(exercises.iter_mut()) {
        exercise.order_index = index;
        exercise.id = generate_child_id(template_id, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_day() -> WorkoutTemplate {
        let mut template = WorkoutTemplate::new("user-1", "Push Day")
            .with_exercise(TemplateExercise::new(
                "bench",
                "Bench Press",
                vec!["chest".into()],
                4,
                RepRange::new(6, 8),
            ))
            .with_exercise(TemplateExercise::new(
                "ohp",
                "Overhead Press",
                vec!["shoulders".into()],
                3,
                RepRange::new(8, 10),
            ));
        template.body_parts = vec!["chest".into(), "shoulders".into()];
        template.estimated_duration_minutes = 50;
        let id = template.id.clone();
        assign_template_order(&id, &mut template.exercises);
        template
    }

    #[test]
    fn test_instantiate_copies_exercises_without_sets() {
        let template = push_day();
        let workout = template.instantiate("user-2");

        assert_eq!(workout.owner_id, "user-2");
        assert_eq!(workout.template_id.as_deref(), Some(template.id.as_str()));
        assert_eq!(workout.planned_duration_minutes, 50);
        assert_eq!(workout.exercises.len(), 2);
        assert!(workout.exercises.iter().all(|e| e.sets.is_empty()));
        assert_eq!(workout.exercises[1].exercise_name, "Overhead Press");
        assert_eq!(workout.exercises[1].order_index, 1);
    }

    #[test]
    fn test_system_sentinel_detection() {
        assert!(!push_day().is_system());
        assert!(WorkoutTemplate::new(ids::SYSTEM_OWNER_ID, "Starter").is_system());
    }

    #[test]
    fn test_enum_parsing_falls_back() {
        assert_eq!(Difficulty::parse("advanced"), Difficulty::Advanced);
        assert_eq!(Difficulty::parse("???"), Difficulty::Beginner);
        assert_eq!(TemplateCategory::parse("bodyweight"), TemplateCategory::Bodyweight);
        assert_eq!(TemplateCategory::parse("???"), TemplateCategory::Custom);
    }
}
