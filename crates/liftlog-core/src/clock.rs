// ABOUTME: Wall-clock access truncated to the precision timestamps are persisted with
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use chrono::{DateTime, SubsecRound, Utc};

/// Digits of sub-second precision kept in stored timestamps
pub const STORED_SUBSEC_DIGITS: u16 = 6;

/// Current UTC time at storage precision (microseconds)
///
/// Values created through this function survive a save/load cycle unchanged.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(STORED_SUBSEC_DIGITS)
}

/// Truncate an arbitrary timestamp to storage precision
#[must_use]
pub fn to_storage_precision(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(STORED_SUBSEC_DIGITS)
}
