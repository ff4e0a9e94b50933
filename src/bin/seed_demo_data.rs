// ABOUTME: Demo data seeder for LiftLog: default user, built-in templates, and sample workouts
// ABOUTME: Idempotent for the user and templates; each run with --workouts adds a fresh history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! Demo data seeder for LiftLog.
//!
//! Usage:
//! ```bash
//! # Create the default user and built-in templates (uses DATABASE_URL)
//! cargo run --bin seed-demo-data
//!
//! # Also log four weeks of completed workouts
//! cargo run --bin seed-demo-data -- --workouts 12
//!
//! # Wipe everything first
//! cargo run --bin seed-demo-data -- --reset --workouts 12
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use liftlog::catalog::{snapshot_exercises, ExerciseMetadata, InMemoryCatalog};
use liftlog::config::{DatabaseConfig, DatabaseUrl};
use liftlog::database::Database;
use liftlog::logging::LoggingConfig;
use liftlog::models::{Workout, WorkoutSet};
use liftlog::statistics::StatisticsEngine;

#[derive(Parser)]
#[command(
    name = "seed-demo-data",
    about = "LiftLog demo data seeder",
    long_about = "Create the local user, the built-in templates, and optionally a history of completed workouts"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Number of completed demo workouts to log
    #[arg(long, default_value_t = 0)]
    workouts: u32,

    /// Drop and recreate every table before seeding
    #[arg(long)]
    reset: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn demo_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new([
        ExerciseMetadata::new("bench-press", "Bench Press", vec!["chest".into(), "triceps".into()])
            .with_equipment("barbell"),
        ExerciseMetadata::new("squat", "Barbell Squat", vec!["legs".into(), "glutes".into()])
            .with_equipment("barbell"),
        ExerciseMetadata::new("barbell-row", "Barbell Row", vec!["back".into(), "biceps".into()])
            .with_equipment("barbell"),
        ExerciseMetadata::new("overhead-press", "Overhead Press", vec!["shoulders".into()])
            .with_equipment("barbell"),
    ])
}

/// Starting load per exercise; each session adds a small increment
const BASE_LOADS: [(&str, f64); 4] = [
    ("bench-press", 60.0),
    ("squat", 80.0),
    ("barbell-row", 50.0),
    ("overhead-press", 35.0),
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    let mut logging = LoggingConfig::from_env();
    if args.verbose {
        "debug".clone_into(&mut logging.level);
    }
    logging.init()?;

    info!("=== LiftLog Demo Data Seeder ===");

    let mut config = DatabaseConfig::from_env()?;
    if let Some(url) = args.database_url.as_deref() {
        config.url = DatabaseUrl::parse_url(url)?;
    }
    info!("Opening database: {}", config.url);
    let db = Database::open(config).await?;

    if args.reset {
        db.reset().await?;
    }

    let owner_id = db.ensure_default_user().await?;
    let seeded = db.templates().seed_system_templates().await?;
    info!("Default user {owner_id} ready, {seeded} system templates inserted");

    if args.workouts > 0 {
        seed_workouts(&db, &owner_id, args.workouts).await?;
    }

    let stats = StatisticsEngine::new(db.clone()).stats(&owner_id).await?;
    info!("");
    info!("=== Seeding Complete ===");
    info!(
        "{} workouts ({} completed), total volume {:.1}",
        stats.total_workouts, stats.completed_workouts, stats.total_volume
    );

    Ok(())
}

/// Log `count` completed sessions rotating through two exercise pairs
async fn seed_workouts(db: &Database, owner_id: &str, count: u32) -> Result<()> {
    let catalog = demo_catalog();
    let workouts = db.workouts();
    let records = db.personal_records();
    let mut new_records = 0;

    for session in 0..count {
        let ids: Vec<String> = if session % 2 == 0 {
            vec!["bench-press".into(), "barbell-row".into()]
        } else {
            vec!["squat".into(), "overhead-press".into()]
        };
        let mut exercises = snapshot_exercises(&catalog, &ids).await?;

        let increment = f64::from(session / 2) * 2.5;
        for exercise in &mut exercises {
            let base = BASE_LOADS
                .iter()
                .find(|(id, _)| *id == exercise.exercise_id)
                .map_or(20.0, |(_, load)| *load);
            exercise.sets = (0..3).map(|_| WorkoutSet::new(base + increment, 8)).collect();
        }

        let mut workout = Workout::new(owner_id, format!("Session {}", session + 1));
        workout.body_parts = exercises
            .iter()
            .flat_map(|e| e.body_parts.iter().cloned())
            .collect();
        workout.exercises = exercises;

        let id = workouts.save(&workout).await?;
        workouts.start(&id).await?;
        let saved = workouts
            .complete(&id)
            .await
            .with_context(|| format!("completing demo workout {id}"))?;

        for exercise in &saved.exercises {
            for set in &exercise.sets {
                new_records += records
                    .check_and_record(set, &exercise.exercise_id, &exercise.exercise_name, owner_id, &id)
                    .await?
                    .len();
            }
        }
    }

    info!("Logged {count} demo workouts, {new_records} personal records set");
    Ok(())
}
