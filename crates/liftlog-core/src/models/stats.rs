// ABOUTME: Aggregate training statistics returned by the statistics engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use serde::{Deserialize, Serialize};

/// Dashboard summary across all of a user's workouts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutStats {
    /// Workouts in any status
    pub total_workouts: u64,
    /// Workouts in `completed` status
    pub completed_workouts: u64,
    /// `completed / total`, 0 when there are no workouts
    pub completion_rate: f64,
    /// Sum of weight × reps over every set of every workout
    pub total_volume: f64,
    /// Mean of completed minus started, over completed workouts with both stamps
    pub average_duration_minutes: f64,
}
