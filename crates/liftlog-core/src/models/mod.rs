// ABOUTME: Domain models for workouts, templates, personal records, users, and statistics
// ABOUTME: Pure aggregate transformations live beside the types they operate on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Models
//!
//! Data structures shared by the storage engine and its callers. Each aggregate
//! root owns its children; child ids are derived from the parent id so that a
//! resubmitted aggregate maps onto the same rows.

/// Personal record rows and record types
pub mod personal_record;
/// Statistics DTOs
pub mod stats;
/// Workout templates
pub mod template;
/// Local user and preferences
pub mod user;
/// Workouts, exercises, and sets
pub mod workout;

pub use personal_record::{PersonalRecord, RecordStats, RecordType};
pub use stats::WorkoutStats;
pub use template::{
    assign_template_order, Difficulty, RepRange, TemplateCategory, TemplateExercise,
    WorkoutTemplate,
};
pub use user::{User, UserPreferences, WeightUnit};
pub use workout::{
    assign_dense_order, merge_duplicate_exercises, normalize_exercises, Workout, WorkoutExercise,
    WorkoutSet, WorkoutStatus,
};
