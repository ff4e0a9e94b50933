// ABOUTME: Transaction management with RAII guards and bounded retry for storage operations
// ABOUTME: Automatic rollback on drop; only StorageUnavailable failures are retried
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! Transaction management with RAII guards and retry patterns
//!
//! - `TransactionGuard`: wrapper that rolls back automatically unless `commit()` is reached
//! - `retry_transaction`: bounded retry with exponential backoff for transient failures
//!
//! Every aggregate write goes through a guard so that an early `?` return leaves
//! no partial aggregate behind. Writes begin with `BEGIN IMMEDIATE` so the write
//! lock is taken up front, where the busy timeout applies, instead of on the first
//! write after a read:
//!
//! ```text
//! let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;
//! sqlx::query("INSERT INTO workouts ...").execute(guard.executor()?).await?;
//! sqlx::query("INSERT INTO workout_exercises ...").execute(guard.executor()?).await?;
//! guard.commit().await?;
//! ```

use std::future::Future;
use std::time::Duration;

use sqlx::{Database, Pool, Sqlite, Transaction};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::errors::{AppError, AppResult};

/// Retry an operation while it fails with a retryable error
///
/// `max_retries` counts retries after the first attempt, so the operation runs
/// at most `max_retries + 1` times. Backoff doubles on every retry starting
/// from `initial_backoff`. Errors for which [`AppError::is_retryable`] is false
/// (constraint violations, not-found, invalid transitions) propagate at once.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retryable error
pub async fn retry_transaction<F, Fut, T>(
    mut f: F,
    max_retries: u32,
    initial_backoff: Duration,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts: u32 = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempts >= max_retries => {
                error!(
                    attempts = attempts + 1,
                    max_retries = max_retries,
                    error = %e,
                    "Storage operation failed after max retries"
                );
                return Err(e);
            }
            Err(e) => {
                let backoff = initial_backoff.saturating_mul(1 << attempts.min(16));
                attempts += 1;
                warn!(
                    attempt = attempts,
                    max_retries = max_retries,
                    backoff_ms = backoff.as_millis(),
                    error = %e,
                    "Storage unavailable, retrying after backoff"
                );
                sleep(backoff).await;
            }
        }
    }
}

/// RAII guard for database transactions ensuring automatic rollback on drop
///
/// Wraps a `SQLx` `Transaction`. Dropping the guard without calling
/// [`commit`](Self::commit) rolls the transaction back (`SQLx` does this when
/// the inner transaction is dropped); the guard logs it.
pub struct TransactionGuard<'c, DB: Database> {
    transaction: Option<Transaction<'c, DB>>,
    committed: bool,
}

impl<'c, DB: Database> TransactionGuard<'c, DB> {
    /// Create a new transaction guard from an existing `SQLx` transaction
    #[must_use]
    pub fn new(transaction: Transaction<'c, DB>) -> Self {
        debug!("TransactionGuard created - transaction will auto-rollback if not committed");
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already consumed or the commit fails
    pub async fn commit(mut self) -> AppResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::from(e).context_message("Transaction commit failed"))?;
                self.committed = true;
                debug!("TransactionGuard committed successfully");
                Ok(())
            }
            None => Err(AppError::internal(
                "Transaction already consumed - cannot commit",
            )),
        }
    }

    /// Explicitly rollback the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback operation fails
    pub async fn rollback(mut self) -> AppResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.rollback().await.map_err(|e| {
                    AppError::from(e).context_message("Transaction rollback failed")
                })?;
                debug!("TransactionGuard rolled back explicitly");
                Ok(())
            }
            None => Err(AppError::internal(
                "Transaction already consumed - cannot rollback",
            )),
        }
    }

    /// Check if the transaction has been committed
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Mutable access to the transaction's connection for executing queries
    ///
    /// # Errors
    ///
    /// Returns an error if the guard is used after commit or rollback
    pub fn executor(&mut self) -> AppResult<&mut <DB as Database>::Connection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::internal("Transaction already consumed - guard used after commit/rollback")
        })
    }
}

impl TransactionGuard<'static, Sqlite> {
    /// Begin a deferred transaction on `pool` and wrap it in a guard
    ///
    /// Used for reads that must see a header and its children together.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if no connection can be acquired
    pub async fn begin(pool: &Pool<Sqlite>) -> AppResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| AppError::from(e).context_message("Failed to begin transaction"))?;
        Ok(Self::new(tx))
    }

    /// Begin a write transaction that holds the database write lock from the start
    ///
    /// Waits up to the connection's busy timeout for other writers to finish.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if no connection can be acquired or the write
    /// lock is still held when the busy timeout expires
    pub async fn begin_immediate(pool: &Pool<Sqlite>) -> AppResult<Self> {
        let tx = pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| AppError::from(e).context_message("Failed to begin write transaction"))?;
        Ok(Self::new(tx))
    }
}

impl<DB: Database> Drop for TransactionGuard<'_, DB> {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            warn!(
                "TransactionGuard dropped without commit - transaction will be rolled back automatically"
            );
        }
    }
}

/// Type alias for `SQLite` transaction guard
pub type SqliteTransactionGuard<'c> = TransactionGuard<'c, Sqlite>;
