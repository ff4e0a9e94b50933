// ABOUTME: Classification of sqlx errors into the engine error taxonomy
// ABOUTME: Separates transient storage failures from constraint and decode failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

use sqlx::error::{DatabaseError, ErrorKind};

use super::{AppError, ErrorCode};

/// Primary `SQLite` result codes for writer contention
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Whether the driver error is `SQLITE_BUSY`/`SQLITE_LOCKED` or one of their extended codes
fn is_lock_error(error: &dyn DatabaseError) -> bool {
    error
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

/// Classify a driver-level database error
///
/// `SQLite` reports lock contention as a plain database error. It is matched by
/// result code first and by message as a fallback, and treated as transient.
fn classify_database_error(error: &dyn DatabaseError) -> ErrorCode {
    if is_lock_error(error) {
        return ErrorCode::StorageUnavailable;
    }
    match error.kind() {
        ErrorKind::UniqueViolation
        | ErrorKind::ForeignKeyViolation
        | ErrorKind::NotNullViolation
        | ErrorKind::CheckViolation => ErrorCode::ConstraintViolation,
        _ => {
            let message = error.message().to_lowercase();
            if message.contains("database is locked")
                || message.contains("busy")
                || message.contains("unable to open database")
            {
                ErrorCode::StorageUnavailable
            } else if message.contains("no such table") {
                // Schema vanished underneath the pool (e.g. a concurrent reset)
                ErrorCode::StorageUnavailable
            } else {
                ErrorCode::DatabaseError
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        let code = match &error {
            sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::Io(_)
            | sqlx::Error::WorkerCrashed => ErrorCode::StorageUnavailable,
            sqlx::Error::RowNotFound => ErrorCode::ResourceNotFound,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                ErrorCode::SerializationError
            }
            sqlx::Error::Database(db_error) => classify_database_error(db_error.as_ref()),
            _ => ErrorCode::DatabaseError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl AppError {
    /// Whether this failure is lock contention between writers
    ///
    /// Contention is transient but says nothing about the health of the handle,
    /// so it is retried without reinitializing the schema.
    #[must_use]
    pub fn is_lock_contention(&self) -> bool {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<sqlx::Error>())
            .is_some_and(|error| {
                matches!(error, sqlx::Error::Database(db_error) if is_lock_error(db_error.as_ref()))
            })
    }
}
