// ABOUTME: Offset pagination parameters for list queries
// ABOUTME: Clamps caller-supplied limits to the storage layer's hard maximum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, limits};

/// Limit and offset for a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// Maximum number of items to return
    pub limit: u32,
    /// Number of items to skip
    pub offset: u32,
}

impl PageParams {
    /// Create pagination parameters, clamping `limit` to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, limits::MAX_PAGE_SIZE),
            offset,
        }
    }

    /// First page of the given size
    #[must_use]
    pub fn first(limit: u32) -> Self {
        Self::new(limit, 0)
    }

    /// The page after this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }

    /// Limit as the signed integer `SQLite` binds
    #[must_use]
    pub fn sql_limit(&self) -> i64 {
        i64::from(self.limit)
    }

    /// Offset as the signed integer `SQLite` binds
    #[must_use]
    pub fn sql_offset(&self) -> i64 {
        i64::from(self.offset)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::first(defaults::PAGE_SIZE)
    }
}
