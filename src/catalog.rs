// ABOUTME: Exercise catalog seam: metadata lookup by id and snapshotting into workouts
// ABOUTME: Workouts copy name, body parts, and equipment at add time so later catalog edits never rewrite history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::WorkoutExercise;

/// Catalog entry as seen by the workout engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseMetadata {
    /// Catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Body parts worked
    pub body_parts: Vec<String>,
    /// Equipment needed, if any
    pub equipment: Option<String>,
}

impl ExerciseMetadata {
    /// Create a catalog entry without equipment
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, body_parts: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            body_parts,
            equipment: None,
        }
    }

    /// Set the equipment
    #[must_use]
    pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.equipment = Some(equipment.into());
        self
    }
}

/// Source of exercise metadata
#[async_trait]
pub trait ExerciseCatalog: Send + Sync {
    /// Entries for the ids that exist; unknown ids are omitted, order is unspecified
    async fn lookup_by_ids(&self, ids: &[String]) -> AppResult<Vec<ExerciseMetadata>>;
}

/// Catalog held in memory, keyed by id
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: HashMap<String, ExerciseMetadata>,
}

impl InMemoryCatalog {
    /// Build a catalog from entries; a later entry replaces an earlier one with the same id
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = ExerciseMetadata>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ExerciseCatalog for InMemoryCatalog {
    async fn lookup_by_ids(&self, ids: &[String]) -> AppResult<Vec<ExerciseMetadata>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect())
    }
}

/// Workout exercises with empty set lists for `ids`, in the requested order
///
/// # Errors
///
/// Returns `ResourceNotFound` naming the first id the catalog does not know, or
/// the catalog's own error
pub async fn snapshot_exercises(
    catalog: &dyn ExerciseCatalog,
    ids: &[String],
) -> AppResult<Vec<WorkoutExercise>> {
    let found: HashMap<String, ExerciseMetadata> = catalog
        .lookup_by_ids(ids)
        .await?
        .into_iter()
        .map(|entry| (entry.id.clone(), entry))
        .collect();

    ids.iter()
        .zip(0_u32..)
        .map(|(id, order_index)| {
            let entry = found
                .get(id)
                .ok_or_else(|| AppError::not_found(format!("Exercise {id}")).with_resource_id(id))?;
            let mut exercise =
                WorkoutExercise::new(entry.id.clone(), entry.name.clone(), entry.body_parts.clone());
            exercise.equipment.clone_from(&entry.equipment);
            exercise.order_index = order_index;
            Ok(exercise)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new([
            ExerciseMetadata::new("bench", "Bench Press", vec!["chest".into()])
                .with_equipment("barbell"),
            ExerciseMetadata::new("squat", "Squat", vec!["legs".into()]),
        ])
    }

    #[tokio::test]
    async fn test_snapshot_keeps_requested_order() {
        let ids = vec!["squat".to_owned(), "bench".to_owned()];
        let exercises = snapshot_exercises(&catalog(), &ids).await.unwrap();

        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].exercise_id, "squat");
        assert_eq!(exercises[0].order_index, 0);
        assert_eq!(exercises[1].exercise_name, "Bench Press");
        assert_eq!(exercises[1].equipment.as_deref(), Some("barbell"));
        assert!(exercises.iter().all(|e| e.sets.is_empty()));
    }

    #[tokio::test]
    async fn test_unknown_exercise_is_not_found() {
        let ids = vec!["bench".to_owned(), "deadlift".to_owned()];
        let error = snapshot_exercises(&catalog(), &ids).await.unwrap_err();
        assert_eq!(error.code, ErrorCode::ResourceNotFound);
        assert!(error.message.contains("deadlift"));
    }
}
