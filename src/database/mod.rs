// ABOUTME: Schema manager owning the SQLite pool lifecycle, health checks, and user bootstrap
// ABOUTME: Shared handle every store clones; transparently reinitializes after storage failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Contributors

//! # Database Management
//!
//! [`Database`] owns the `SQLite` connection pool and the schema. It is cheap to
//! clone; every store holds a clone and obtains the current pool through
//! [`Database::with_retry`], which grants a bounded retry to operations failing
//! with `StorageUnavailable` after reinitializing the handle.
//!
//! Reinitialization never deletes a database file: it reopens a closed pool and
//! re-runs the idempotent schema creation.

/// Column codecs shared by the stores
pub mod mappers;
/// Personal record detection and queries
pub mod personal_records;
/// Table and index definitions
pub mod schema;
/// Template persistence
pub mod templates;
/// RAII transaction guard and retry helper
pub mod transactions;
/// Aggregate validation
pub mod validation;
/// Workout persistence and lifecycle transitions
pub mod workouts;

pub use personal_records::PersonalRecordsManager;
pub use templates::TemplatesManager;
pub use transactions::{retry_transaction, SqliteTransactionGuard, TransactionGuard};
pub use workouts::WorkoutsManager;

use std::fmt::Display;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock;
use crate::config::DatabaseConfig;
use crate::constants::{defaults, ids, tables};
use crate::errors::{AppError, AppResult};
use crate::identifiers;
use crate::models::{User, UserPreferences};
use mappers::{format_timestamp, parse_timestamp, row_to_user_preferences};

/// Result of [`Database::health_check`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaHealth {
    /// Whether the pool is open and answering queries
    pub open: bool,
    /// Expected tables that do not exist
    pub missing_tables: Vec<String>,
}

impl SchemaHealth {
    /// Open and schema-complete
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.open && self.missing_tables.is_empty()
    }
}

struct DatabaseInner {
    config: DatabaseConfig,
    pool: RwLock<SqlitePool>,
    init_lock: Mutex<()>,
    needs_reinit: AtomicBool,
}

/// Shared storage handle and schema manager
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Open (creating if needed) the database and ensure the schema exists
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the file cannot be opened, or an error
    /// from schema creation
    pub async fn open(config: DatabaseConfig) -> AppResult<Self> {
        let pool = connect(&config).await?;
        schema::create_schema(&pool).await?;
        info!(url = %config.url, max_connections = config.effective_max_connections(), "Database opened");

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                config,
                pool: RwLock::new(pool),
                init_lock: Mutex::new(()),
                needs_reinit: AtomicBool::new(false),
            }),
        })
    }

    /// Open the database described by the environment
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the database cannot be opened
    pub async fn open_from_env() -> AppResult<Self> {
        Self::open(DatabaseConfig::from_env()?).await
    }

    /// Configuration this handle was opened with
    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    /// Current pool handle, without readiness checks
    ///
    /// # Errors
    ///
    /// Returns an internal error if the handle lock is poisoned
    pub fn pool(&self) -> AppResult<SqlitePool> {
        self.inner
            .pool
            .read()
            .map(|pool| pool.clone())
            .map_err(|_| AppError::internal("Database handle lock poisoned"))
    }

    /// Store for workouts on this database
    #[must_use]
    pub fn workouts(&self) -> WorkoutsManager {
        WorkoutsManager::new(self.clone())
    }

    /// Store for templates on this database
    #[must_use]
    pub fn templates(&self) -> TemplatesManager {
        TemplatesManager::new(self.clone())
    }

    /// Personal record detector on this database
    #[must_use]
    pub fn personal_records(&self) -> PersonalRecordsManager {
        PersonalRecordsManager::new(self.clone())
    }

    /// Derive a child identifier from its parent id and a sibling-unique key
    #[must_use]
    pub fn generate_child_id(parent_id: &str, child_key: impl Display) -> String {
        identifiers::generate_child_id(parent_id, child_key)
    }

    fn mark_for_reinit(&self) {
        self.inner.needs_reinit.store(true, Ordering::Release);
    }

    /// Pool that is open and has the schema, reinitializing first if needed
    async fn ready_pool(&self) -> AppResult<SqlitePool> {
        let pool = self.pool()?;
        if !pool.is_closed() && !self.inner.needs_reinit.load(Ordering::Acquire) {
            return Ok(pool);
        }
        self.reinitialize().await
    }

    async fn reinitialize(&self) -> AppResult<SqlitePool> {
        let _init = self.inner.init_lock.lock().await;

        let current = self.pool()?;
        if !current.is_closed() && !self.inner.needs_reinit.load(Ordering::Acquire) {
            // Another caller finished reinitializing while we waited
            return Ok(current);
        }

        let pool = if current.is_closed() {
            warn!(url = %self.inner.config.url, "Storage handle closed, reopening");
            connect(&self.inner.config).await?
        } else {
            current
        };
        schema::create_schema(&pool).await?;

        *self
            .inner
            .pool
            .write()
            .map_err(|_| AppError::internal("Database handle lock poisoned"))? = pool.clone();
        self.inner.needs_reinit.store(false, Ordering::Release);
        info!("Storage handle reinitialized");
        Ok(pool)
    }

    /// Run `operation` against a ready pool with the configured retry budget
    ///
    /// A `StorageUnavailable` failure waits the backoff and runs `operation`
    /// again. Unless the failure was writer contention, the handle is also
    /// marked for reinitialization first. Any other error is
    /// returned immediately. `context` prefixes the final error message.
    ///
    /// # Errors
    ///
    /// Returns the operation's error, or `StorageUnavailable` once retries are
    /// exhausted
    pub async fn with_retry<T, F, Fut>(&self, context: &str, operation: F) -> AppResult<T>
    where
        F: Fn(SqlitePool) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let operation = &operation;
        retry_transaction(
            || async move {
                let pool = self.ready_pool().await?;
                let result = operation(pool).await;
                // Writer contention is retried on the same handle
                if matches!(&result, Err(e) if e.is_retryable() && !e.is_lock_contention()) {
                    self.mark_for_reinit();
                }
                result
            },
            self.inner.config.storage_retries,
            self.inner.config.retry_backoff(),
        )
        .await
        .map_err(|e| e.context_message(context))
    }

    /// Report whether the handle is open and every expected table exists
    ///
    /// An unhealthy result marks the handle so the next operation reopens the
    /// pool and recreates missing tables. Existing data is never touched.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures other than storage unavailability
    pub async fn health_check(&self) -> AppResult<SchemaHealth> {
        let pool = self.pool()?;
        let all_tables = || tables::ALL.iter().map(|t| (*t).to_owned()).collect();

        if pool.is_closed() {
            self.mark_for_reinit();
            return Ok(SchemaHealth {
                open: false,
                missing_tables: all_tables(),
            });
        }

        match schema::missing_tables(&pool).await {
            Ok(missing_tables) => {
                if !missing_tables.is_empty() {
                    warn!(?missing_tables, "Schema incomplete, scheduling reinitialization");
                    self.mark_for_reinit();
                }
                Ok(SchemaHealth {
                    open: true,
                    missing_tables,
                })
            }
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "Health check could not reach storage");
                self.mark_for_reinit();
                Ok(SchemaHealth {
                    open: false,
                    missing_tables: all_tables(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Create the local user and its preferences if absent; return its id
    ///
    /// Safe under concurrent first calls: both inserts are `ON CONFLICT DO NOTHING`
    /// upserts in one transaction, so exactly one user row ever exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the inserts fail
    pub async fn ensure_default_user(&self) -> AppResult<String> {
        self.with_retry("Failed to ensure default user", |pool| async move {
            let now = format_timestamp(clock::now());
            let mut guard = SqliteTransactionGuard::begin_immediate(&pool).await?;

            sqlx::query(
                r"
                INSERT INTO users (id, display_name, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT(id) DO NOTHING
                ",
            )
            .bind(ids::DEFAULT_USER_ID)
            .bind(ids::DEFAULT_USER_NAME)
            .bind(&now)
            .execute(guard.executor()?)
            .await?;

            sqlx::query(
                r"
                INSERT INTO user_preferences (user_id, weight_unit, default_rest_seconds, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT(user_id) DO NOTHING
                ",
            )
            .bind(ids::DEFAULT_USER_ID)
            .bind(defaults::WEIGHT_UNIT)
            .bind(i64::from(defaults::REST_SECONDS))
            .bind(&now)
            .execute(guard.executor()?)
            .await?;

            guard.commit().await
        })
        .await?;

        debug!(user_id = ids::DEFAULT_USER_ID, "Default user ensured");
        Ok(ids::DEFAULT_USER_ID.to_owned())
    }

    /// Get a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        self.with_retry("Failed to get user", |pool| async move {
            let row = sqlx::query("SELECT id, display_name, created_at FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&pool)
                .await?;
            row.as_ref().map(row_to_user).transpose()
        })
        .await
    }

    /// Number of user rows
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_users(&self) -> AppResult<u64> {
        self.with_retry("Failed to count users", |pool| async move {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(&pool)
                .await?;
            Ok(mappers::count_to_u64(count))
        })
        .await
    }

    /// Get a user's preferences
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_preferences(&self, user_id: &str) -> AppResult<Option<UserPreferences>> {
        self.with_retry("Failed to get preferences", |pool| async move {
            let row = sqlx::query(
                r"
                SELECT user_id, weight_unit, default_rest_seconds, updated_at
                FROM user_preferences
                WHERE user_id = $1
                ",
            )
            .bind(user_id)
            .fetch_optional(&pool)
            .await?;
            row.as_ref().map(row_to_user_preferences).transpose()
        })
        .await
    }

    /// Overwrite a user's preferences and return the stored row
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user has no preferences row
    pub async fn update_preferences(&self, preferences: &UserPreferences) -> AppResult<UserPreferences> {
        let updated = UserPreferences {
            updated_at: clock::now(),
            ..preferences.clone()
        };

        let rows = self
            .with_retry("Failed to update preferences", |pool| {
                let updated = &updated;
                async move {
                    let result = sqlx::query(
                        r"
                        UPDATE user_preferences
                        SET weight_unit = $1, default_rest_seconds = $2, updated_at = $3
                        WHERE user_id = $4
                        ",
                    )
                    .bind(updated.weight_unit.as_str())
                    .bind(i64::from(updated.default_rest_seconds))
                    .bind(format_timestamp(updated.updated_at))
                    .bind(&updated.user_id)
                    .execute(&pool)
                    .await?;
                    Ok(result.rows_affected())
                }
            })
            .await?;

        if rows == 0 {
            return Err(AppError::not_found(format!(
                "Preferences for user {}",
                preferences.user_id
            ))
            .with_owner_id(&preferences.user_id));
        }
        info!(user_id = %updated.user_id, weight_unit = updated.weight_unit.as_str(), "Preferences updated");
        Ok(updated)
    }

    /// Drop every table and recreate the schema. Destroys all data.
    ///
    /// # Errors
    ///
    /// Returns an error if dropping or recreating fails
    pub async fn reset(&self) -> AppResult<()> {
        let _init = self.inner.init_lock.lock().await;
        let mut pool = self.pool()?;
        if pool.is_closed() {
            pool = connect(&self.inner.config).await?;
            *self
                .inner
                .pool
                .write()
                .map_err(|_| AppError::internal("Database handle lock poisoned"))? = pool.clone();
        }

        warn!(url = %self.inner.config.url, "Resetting database: dropping all tables");
        schema::drop_schema(&pool).await?;
        schema::create_schema(&pool).await?;
        self.inner.needs_reinit.store(false, Ordering::Release);
        info!("Database reset complete");
        Ok(())
    }

    /// Close the pool; the next operation reopens it
    pub async fn close(&self) {
        if let Ok(pool) = self.pool() {
            pool.close().await;
        }
        self.mark_for_reinit();
        info!("Database closed");
    }
}

/// Open a pool with WAL, foreign keys, and a busy timeout on every connection
async fn connect(config: &DatabaseConfig) -> AppResult<SqlitePool> {
    let options = match config.url.path() {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::storage_unavailable(format!(
                        "Cannot create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            SqliteConnectOptions::new().filename(path)
        }
        None => SqliteConnectOptions::from_str(&config.url.to_connection_string())
            .map_err(|e| AppError::from(e).context_message("Invalid database URL"))?,
    };
    let options = options
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.busy_timeout());

    let mut pool_options =
        SqlitePoolOptions::new().max_connections(config.effective_max_connections());
    if config.url.is_memory() {
        // The database lives only as long as its connection
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    pool_options
        .connect_with(options)
        .await
        .map_err(|e| AppError::from(e).context_message("Failed to open database"))
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let created_at: String = row.try_get("created_at")?;
    Ok(User {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
        created_at: parse_timestamp(&created_at)?,
    })
}
