// ABOUTME: Identifier generation for aggregate roots and their owned children
// ABOUTME: Random ids for roots, deterministic parent-derived ids for children
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use std::fmt::Display;

use uuid::Uuid;

use crate::constants::ids::CHILD_ID_SEPARATOR;

/// Generate a collision-resistant identifier for an aggregate root
#[must_use]
pub fn new_root_id() -> String {
    Uuid::new_v4().to_string()
}

/// Derive a child identifier from its parent and a key unique among its siblings
///
/// Pure function of its inputs: re-submitting the same logical child yields the
/// same id, which is what makes child upserts idempotent.
///
/// Neither part may contain [`CHILD_ID_SEPARATOR`]; otherwise parent `a` with
/// key `b:c` and parent `a:b` with key `c` would both map to `a:b:c`. The stores
/// reject such ids before they get here.
///
/// ```
/// use liftlog_core::identifiers::generate_child_id;
///
/// assert_eq!(generate_child_id("w1", "bench-press"), "w1:bench-press");
/// assert_eq!(generate_child_id("w1:bench-press", 2), "w1:bench-press:2");
/// ```
#[must_use]
pub fn generate_child_id(parent_id: &str, child_key: impl Display) -> String {
    format!("{parent_id}{CHILD_ID_SEPARATOR}{child_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_id_is_deterministic() {
        assert_eq!(
            generate_child_id("workout-1", "squat"),
            generate_child_id("workout-1", "squat")
        );
        assert_ne!(
            generate_child_id("workout-1", "squat"),
            generate_child_id("workout-2", "squat")
        );
    }

    #[test]
    fn test_root_ids_are_unique() {
        assert_ne!(new_root_id(), new_root_id());
    }
}
