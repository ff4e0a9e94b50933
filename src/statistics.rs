// ABOUTME: Workout statistics: totals, completion rate, volume, and per-body-part volume
// ABOUTME: Pure aggregation functions plus a thin engine that loads an owner's workouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Statistics Engine
//!
//! All math lives in [`compute_stats`] and [`compute_volume_by_body_part`], which
//! take a slice of workouts and never touch storage. [`StatisticsEngine`] loads
//! an owner's workouts and hands them to those functions.
//!
//! Volume is `weight × reps` summed over every set regardless of workout status
//! or whether the set is marked completed.

use std::collections::BTreeMap;

use tracing::debug;

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{Workout, WorkoutStats, WorkoutStatus};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Aggregate statistics over a set of workouts
#[must_use]
pub fn compute_stats(workouts: &[Workout]) -> WorkoutStats {
    let total_workouts = workouts.len() as u64;
    let completed: Vec<&Workout> = workouts
        .iter()
        .filter(|w| w.status == WorkoutStatus::Completed)
        .collect();
    let completed_workouts = completed.len() as u64;

    let completion_rate = if total_workouts == 0 {
        0.0
    } else {
        completed_workouts as f64 / total_workouts as f64
    };

    let total_volume = workouts.iter().map(Workout::total_volume).sum();

    // Completed workouts missing a stamp are skipped rather than counted as zero
    let durations: Vec<f64> = completed
        .iter()
        .filter_map(|w| w.duration())
        .map(|d| d.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_MINUTE)
        .collect();
    let average_duration_minutes = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<f64>() / durations.len() as f64
    };

    WorkoutStats {
        total_workouts,
        completed_workouts,
        completion_rate,
        total_volume,
        average_duration_minutes,
    }
}

/// Volume attributed to each body part
///
/// An exercise's volume is divided evenly across its snapshot body parts; an
/// exercise with no body parts contributes nothing.
#[must_use]
pub fn compute_volume_by_body_part(workouts: &[Workout]) -> BTreeMap<String, f64> {
    let mut volumes = BTreeMap::new();
    for exercise in workouts.iter().flat_map(|w| &w.exercises) {
        if exercise.body_parts.is_empty() {
            continue;
        }
        let share = exercise.volume() / exercise.body_parts.len() as f64;
        for part in &exercise.body_parts {
            *volumes.entry(part.clone()).or_insert(0.0) += share;
        }
    }
    volumes
}

/// Statistics over an owner's stored workouts
#[derive(Clone)]
pub struct StatisticsEngine {
    db: Database,
}

impl StatisticsEngine {
    /// Create a statistics engine over `db`
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Statistics over every workout of `owner_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the workouts cannot be loaded
    pub async fn stats(&self, owner_id: &str) -> AppResult<WorkoutStats> {
        let workouts = self.db.workouts().list_all(owner_id).await?;
        let stats = compute_stats(&workouts);
        debug!(
            owner_id = %owner_id,
            total = stats.total_workouts,
            completed = stats.completed_workouts,
            volume = stats.total_volume,
            "Computed workout stats"
        );
        Ok(stats)
    }

    /// Volume per body part over every workout of `owner_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the workouts cannot be loaded
    pub async fn volume_by_body_part(&self, owner_id: &str) -> AppResult<BTreeMap<String, f64>> {
        let workouts = self.db.workouts().list_all(owner_id).await?;
        Ok(compute_volume_by_body_part(&workouts))
    }
}
