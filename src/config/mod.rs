// ABOUTME: Configuration management module for the storage engine
// ABOUTME: Environment-only configuration, loaded once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! Configuration module
//!
//! All settings come from environment variables; there is no configuration file.
//!
//! - **Database**: `SQLite` location, pool size, busy timeout, storage retry budget

/// Database location and pool settings
pub mod database;

pub use database::{DatabaseConfig, DatabaseUrl};
