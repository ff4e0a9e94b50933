// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Well-known identifiers, user defaults, storage limits, and table names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single flat list.

/// Identifiers with fixed, installation-independent values
pub mod ids {
    /// The single local user created by `ensure_default_user`
    pub const DEFAULT_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
    /// Owner of built-in templates; never a real user
    pub const SYSTEM_OWNER_ID: &str = "00000000-0000-0000-0000-000000000000";
    /// Display name given to the bootstrapped local user
    pub const DEFAULT_USER_NAME: &str = "Local Athlete";
    /// Separator used by deterministic child id generation
    pub const CHILD_ID_SEPARATOR: char = ':';
}

/// Defaults applied when a user or template omits a value
pub mod defaults {
    /// Weight unit stored for a freshly bootstrapped user
    pub const WEIGHT_UNIT: &str = "kg";
    /// Rest period between sets for a freshly bootstrapped user
    pub const REST_SECONDS: u32 = 90;
    /// Default page size for list queries
    pub const PAGE_SIZE: u32 = 20;
    /// Default planned duration for a workout instantiated from a template without one
    pub const PLANNED_DURATION_MINUTES: u32 = 60;
    /// Default database location
    pub const DATABASE_URL: &str = "sqlite:./data/liftlog.db";
}

/// Hard limits protecting the storage layer
pub mod limits {
    /// Largest page a list query will return
    pub const MAX_PAGE_SIZE: u32 = 500;
    /// Bounded retry budget for transient storage failures
    pub const STORAGE_RETRIES: u32 = 1;
    /// Backoff before the storage retry
    pub const STORAGE_RETRY_BACKOFF_MS: u64 = 50;
    /// `SQLite` busy timeout applied to every pooled connection
    pub const BUSY_TIMEOUT_SECS: u64 = 5;
    /// Pool size for file-backed databases
    pub const MAX_CONNECTIONS: u32 = 5;
}

/// Table names owned by the schema manager
pub mod tables {
    /// Local user identity rows
    pub const USERS: &str = "users";
    /// Per-user preferences
    pub const USER_PREFERENCES: &str = "user_preferences";
    /// Workout headers
    pub const WORKOUTS: &str = "workouts";
    /// Exercises owned by a workout
    pub const WORKOUT_EXERCISES: &str = "workout_exercises";
    /// Sets owned by a workout exercise
    pub const WORKOUT_SETS: &str = "workout_sets";
    /// Template headers
    pub const WORKOUT_TEMPLATES: &str = "workout_templates";
    /// Exercises owned by a template
    pub const TEMPLATE_EXERCISES: &str = "template_exercises";
    /// Current best per owner, exercise, and record type
    pub const PERSONAL_RECORDS: &str = "personal_records";

    /// Every table, parents before children
    pub const ALL: [&str; 8] = [
        USERS,
        USER_PREFERENCES,
        WORKOUTS,
        WORKOUT_EXERCISES,
        WORKOUT_SETS,
        WORKOUT_TEMPLATES,
        TEMPLATE_EXERCISES,
        PERSONAL_RECORDS,
    ];
}
