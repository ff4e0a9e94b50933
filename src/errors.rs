// ABOUTME: Re-export of the unified error types from liftlog-core
// ABOUTME: Storage code imports errors from here so the core crate stays an implementation detail
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Error Handling
//!
//! `AppError`, `ErrorCode`, and `AppResult` live in `liftlog-core` together with
//! the `sqlx::Error` classification (enabled through the `database-errors`
//! feature). This module re-exports them for the storage engine.

pub use liftlog_core::errors::{AppError, AppResult, ErrorCode, ErrorContext};
