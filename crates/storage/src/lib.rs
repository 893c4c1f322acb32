//! Storage layer for the Dayplan backend.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub mod error;
pub mod feedback_repository;
pub mod note_repository;
pub mod plan_repository;
pub mod task_repository;
pub mod user_repository;

pub use error::StorageError;
pub use feedback_repository::{FeedbackRepository, FeedbackRow, FeedbackWithTraits};
pub use note_repository::{NoteRepository, NoteRow};
pub use plan_repository::{
    ConflictRow, ItemWithPlan, PlanItemRow, PlanItemWithTitle, PlanRepository, PlanRow,
};
pub use task_repository::{NewTask, TaskRepository, TaskRow};
pub use user_repository::{SettingsRow, UserRepository, UserRow};

/// Create a SQLite connection pool, creating the database file if needed.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(StorageError::Connection)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(StorageError::Connection)
}

/// Run database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(StorageError::Migration)
}

/// Check database connectivity.
pub async fn check_connection(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(StorageError::Query)?;
    Ok(())
}
