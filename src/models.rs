// ABOUTME: Re-export of the domain models defined in liftlog-core
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Models
//!
//! Workouts, templates, personal records, users, and statistics DTOs. Defined in
//! `liftlog-core`; the stores in [`crate::database`] persist them.

pub use liftlog_core::models::*;
pub use liftlog_core::pagination::PageParams;
