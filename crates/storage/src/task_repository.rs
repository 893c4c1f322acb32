//! Task repository.

use chrono::{NaiveDateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use dayplan_domain::TaskStatus;

use crate::StorageError;

/// Task record from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub deadline: NaiveDateTime,
    pub category: String,
    pub importance: String,
    pub preferred_time: String,
    pub energy: String,
    pub status: TaskStatus,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Fields for task creation; tag strings arrive already lowercased.
#[derive(Debug)]
pub struct NewTask<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub duration_minutes: i64,
    pub deadline: NaiveDateTime,
    pub category: &'a str,
    pub importance: &'a str,
    pub preferred_time: &'a str,
    pub energy: &'a str,
}

const TASK_COLUMNS: &str = "id, user_id, title, description, duration_minutes, deadline, \
     category, importance, preferred_time, energy, status, created_at, updated_at";

/// Task repository.
#[derive(Clone)]
pub struct TaskRepository {
    pool: SqlitePool,
}

impl TaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: NewTask<'_>) -> Result<TaskRow, StorageError> {
        let now = Utc::now().naive_utc();
        sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks
                (user_id, title, description, duration_minutes, deadline,
                 category, importance, preferred_time, energy, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10, ?10)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.user_id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.duration_minutes)
        .bind(task.deadline)
        .bind(task.category)
        .bind(task.importance)
        .bind(task.preferred_time)
        .bind(task.energy)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<TaskRow>, StorageError> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY deadline ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn get_for_user(
        &self,
        task_id: i64,
        user_id: i64,
    ) -> Result<Option<TaskRow>, StorageError> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"
        ))
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    /// Delete one task; returns whether a row was removed.
    pub async fn delete_for_user(&self, task_id: i64, user_id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND user_id = ?2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Query)?;
        Ok(result.rows_affected() > 0)
    }

    /// Tasks eligible for planning: deadline inside the lookahead window and
    /// still pending or unscheduled. Exclusion of already-placed tasks stays
    /// at the caller, which knows the horizon's plans.
    pub async fn eligible_for_planning_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> Result<Vec<TaskRow>, StorageError> {
        sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE user_id = ?1
              AND deadline >= ?2
              AND deadline <= ?3
              AND status IN ('pending', 'unscheduled')
            ORDER BY deadline ASC
            "#
        ))
        .bind(user_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&mut **tx)
        .await
        .map_err(StorageError::Query)
    }

    /// Unscheduled tasks whose deadline has not passed the given instant.
    pub async fn unscheduled_since(
        &self,
        user_id: i64,
        since: NaiveDateTime,
    ) -> Result<Vec<TaskRow>, StorageError> {
        sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE user_id = ?1 AND status = 'unscheduled' AND deadline >= ?2
            ORDER BY deadline ASC
            "#
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn set_status_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(Utc::now().naive_utc())
            .bind(task_id)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::Query)?;
        Ok(())
    }

    pub async fn set_status(&self, task_id: i64, status: TaskStatus) -> Result<(), StorageError> {
        sqlx::query("UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(Utc::now().naive_utc())
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Query)?;
        Ok(())
    }
}
