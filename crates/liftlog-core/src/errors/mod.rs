// ABOUTME: Unified error handling with AppError, ErrorCode, and storage error classification
// ABOUTME: Maps sqlx and serde failures onto the engine's error taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Unified Error Handling System
//!
//! Every fallible operation in the engine returns [`AppResult`]. The [`ErrorCode`]
//! is the machine-readable kind callers branch on; the message is diagnostic text
//! for logs and is never meant to be shown to an end user verbatim.
//!
//! Only [`ErrorCode::StorageUnavailable`] is considered transient (see
//! [`AppError::is_retryable`]). Everything else propagates immediately.

#[cfg(feature = "database-errors")]
mod database;

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    /// Malformed input that never reached storage
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// A required field is missing or a storage constraint rejected the write
    #[serde(rename = "CONSTRAINT_VIOLATION")]
    ConstraintViolation = 3001,

    // Resource Management (4000-4999)
    /// The requested row does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    /// A workout status transition was requested from the wrong source state
    #[serde(rename = "INVALID_STATE_TRANSITION")]
    InvalidStateTransition = 4001,
    /// Attempted mutation of a system-owned resource
    #[serde(rename = "FORBIDDEN")]
    Forbidden = 4002,

    // Configuration (6000-6999)
    /// Invalid or missing configuration
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Storage rejected the statement for a non-transient reason
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    /// Storage handle is closed, unreachable, or busy
    #[serde(rename = "STORAGE_UNAVAILABLE")]
    StorageUnavailable = 9002,
    /// Stored data could not be encoded or decoded
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Short description of this error kind, used as the log prefix
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::ConstraintViolation => "A data constraint was violated",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::InvalidStateTransition => "The requested status transition is not allowed",
            Self::Forbidden => "The resource cannot be modified by this owner",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::StorageUnavailable => "Storage is temporarily unavailable",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Owner the failing operation ran for, if known
    pub owner_id: Option<String>,
    /// Resource ID if applicable
    pub resource_id: Option<String>,
}

/// Unified error type for the engine
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Diagnostic message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add an owner ID to the error context
    #[must_use]
    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.context.owner_id = Some(owner_id.into());
        self
    }

    /// Add a resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Prefix the message with the operation that failed, keeping the code
    #[must_use]
    pub fn context_message(mut self, operation: &str) -> Self {
        self.message = format!("{operation}: {}", self.message);
        self
    }

    /// Whether a bounded retry may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.code, ErrorCode::StorageUnavailable)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience functions for creating common errors
impl AppError {
    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing required field or violated storage constraint
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConstraintViolation, message)
    }

    /// Status transition from the wrong source state
    pub fn invalid_state_transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidStateTransition,
            format!("cannot transition from {from} to {to}"),
        )
    }

    /// Mutation of a resource the caller does not own
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Storage handle not open or temporarily unreachable
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageUnavailable, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

impl From<uuid::Error> for AppError {
    fn from(error: uuid::Error) -> Self {
        Self::new(ErrorCode::SerializationError, format!("Invalid UUID: {error}"))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(error: chrono::ParseError) -> Self {
        Self::new(
            ErrorCode::SerializationError,
            format!("Invalid datetime: {error}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_unavailable_is_retryable() {
        assert!(AppError::storage_unavailable("pool closed").is_retryable());
        assert!(!AppError::constraint_violation("owner_id is required").is_retryable());
        assert!(!AppError::database("syntax error").is_retryable());
        assert!(!AppError::not_found("Workout w1").is_retryable());
    }

    #[test]
    fn test_app_error_context() {
        let error = AppError::forbidden("system template")
            .with_owner_id("user-1")
            .with_resource_id("tpl-1");

        assert_eq!(error.code, ErrorCode::Forbidden);
        assert_eq!(error.context.owner_id.as_deref(), Some("user-1"));
        assert_eq!(error.context.resource_id.as_deref(), Some("tpl-1"));
    }

    #[test]
    fn test_display_uses_code_description() {
        let error = AppError::invalid_state_transition("planned", "completed");
        let rendered = error.to_string();
        assert!(rendered.starts_with("The requested status transition is not allowed"));
        assert!(rendered.contains("planned"));
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InvalidStateTransition).unwrap();
        assert_eq!(json, "\"INVALID_STATE_TRANSITION\"");
    }

    #[test]
    fn test_context_message_keeps_code() {
        let error = AppError::storage_unavailable("pool closed").context_message("Failed to save");
        assert_eq!(error.code, ErrorCode::StorageUnavailable);
        assert_eq!(error.message, "Failed to save: pool closed");
    }
}
