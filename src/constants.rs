// ABOUTME: Re-export of the engine constants defined in liftlog-core
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Constants Module
//!
//! Well-known identifiers, defaults, limits, and table names. Defined in the
//! core crate so models and storage agree on them.

pub use liftlog_core::constants::{defaults, ids, limits, tables};
