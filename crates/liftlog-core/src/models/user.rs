// ABOUTME: Local user identity and training preferences models
// ABOUTME: WeightUnit enum with database string conversion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::constants::defaults;

/// Unit the user logs weights in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    /// Kilograms
    #[default]
    Kg,
    /// Pounds
    Lb,
}

impl WeightUnit {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Lb => "lb",
        }
    }

    /// Parse from database string representation
    ///
    /// Unknown values fall back to kilograms.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "lb" | "lbs" => Self::Lb,
            _ => Self::Kg,
        }
    }
}

/// The identity anchor every workout, template, and record hangs off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Well-known identifier
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Per-user preferences created alongside the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Owning user
    pub user_id: String,
    /// Unit weights are displayed and entered in
    pub weight_unit: WeightUnit,
    /// Default rest between sets
    pub default_rest_seconds: u32,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    /// Preferences a freshly created user starts with
    #[must_use]
    pub fn defaults_for(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            weight_unit: WeightUnit::parse(defaults::WEIGHT_UNIT),
            default_rest_seconds: defaults::REST_SECONDS,
            updated_at: clock::now(),
        }
    }
}
