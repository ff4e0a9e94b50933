// ABOUTME: Core types and constants for the LiftLog workout persistence engine
// ABOUTME: Foundation crate with error handling, domain models, pagination, and identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

#![deny(unsafe_code)]

//! # LiftLog Core
//!
//! Foundation crate providing shared types for the LiftLog storage engine. It has
//! no storage dependency of its own (sqlx is only pulled in for error
//! conversion), so everything here is pure and unit-testable.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Well-known ids, defaults, limits, and table names
//! - **clock**: Current time truncated to stored precision
//! - **identifiers**: Root and deterministic child id generation
//! - **models**: Workouts, templates, personal records, users, statistics
//! - **pagination**: Offset pagination parameters

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Wall clock at storage precision
pub mod clock;

/// Root and child identifier generation
pub mod identifiers;

/// Core data models and pure aggregate transformations
pub mod models;

/// Offset pagination for list queries
pub mod pagination;
