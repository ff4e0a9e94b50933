// ABOUTME: Personal record models: record types, the record row, and record summary stats
// ABOUTME: Extracts the per-type candidate value from a logged set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::workout::WorkoutSet;

/// Which quantity a personal record tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Heaviest weight in a single set
    Weight,
    /// Largest weight × reps in a single set
    Volume,
    /// Most reps in a single set
    Reps,
}

impl RecordType {
    /// Every record type, in evaluation order
    pub const ALL: [Self; 3] = [Self::Weight, Self::Volume, Self::Reps];

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Volume => "volume",
            Self::Reps => "reps",
        }
    }

    /// Parse from database string representation
    ///
    /// Unknown values default to `Weight`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "volume" => Self::Volume,
            "reps" => Self::Reps,
            _ => Self::Weight,
        }
    }

    /// The value of `set` this record type compares
    #[must_use]
    pub fn value_for(&self, set: &WorkoutSet) -> f64 {
        match self {
            Self::Weight => set.weight,
            Self::Volume => set.volume(),
            Self::Reps => f64::from(set.reps),
        }
    }
}

/// Current best for one (owner, exercise, type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    /// Unique identifier
    pub id: String,
    /// Owning user
    pub owner_id: String,
    /// Catalog exercise id
    pub exercise_id: String,
    /// Exercise name at the time of the record
    pub exercise_name: String,
    /// Tracked quantity
    pub record_type: RecordType,
    /// The best value so far
    pub value: f64,
    /// Workout the record was set in
    pub workout_id: String,
    /// When the record was set
    pub achieved_at: DateTime<Utc>,
    /// Best value this record replaced, absent for a first record
    pub previous_value: Option<f64>,
}

impl PersonalRecord {
    /// Improvement over the superseded best
    #[must_use]
    pub fn improvement(&self) -> Option<f64> {
        self.previous_value.map(|previous| self.value - previous)
    }
}

/// Summary counters for the records dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordStats {
    /// Number of current records
    pub total_records: u64,
    /// Records achieved since the start of the current calendar month (UTC)
    pub records_this_month: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_for_each_type() {
        let set = WorkoutSet::new(100.0, 5);
        assert!((RecordType::Weight.value_for(&set) - 100.0).abs() < f64::EPSILON);
        assert!((RecordType::Volume.value_for(&set) - 500.0).abs() < f64::EPSILON);
        assert!((RecordType::Reps.value_for(&set) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_type_parse() {
        for record_type in RecordType::ALL {
            assert_eq!(RecordType::parse(record_type.as_str()), record_type);
        }
        assert_eq!(RecordType::parse("nope"), RecordType::Weight);
    }
}
