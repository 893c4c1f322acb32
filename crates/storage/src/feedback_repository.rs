//! Feedback log repository. Entries are append-only.

use chrono::{NaiveDateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::StorageError;

/// Feedback record from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub user_id: i64,
    pub task_id: Option<i64>,
    pub outcome: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Feedback entry joined with the traits of its linked task; what the bias
/// learner consumes. Task columns are null when the task was deleted or the
/// entry was never linked.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedbackWithTraits {
    pub outcome: i32,
    pub created_at: NaiveDateTime,
    pub category: Option<String>,
    pub importance: Option<String>,
    pub preferred_time: Option<String>,
    pub energy: Option<String>,
}

const FEEDBACK_COLUMNS: &str = "id, user_id, task_id, outcome, note, created_at";

/// Feedback repository.
#[derive(Clone)]
pub struct FeedbackRepository {
    pool: SqlitePool,
}

impl FeedbackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        user_id: i64,
        task_id: Option<i64>,
        outcome: i32,
        note: Option<&str>,
    ) -> Result<FeedbackRow, StorageError> {
        sqlx::query_as::<_, FeedbackRow>(&format!(
            r#"
            INSERT INTO feedback_logs (user_id, task_id, outcome, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {FEEDBACK_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(task_id)
        .bind(outcome)
        .bind(note)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        task_id: Option<i64>,
        outcome: i32,
        note: Option<&str>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO feedback_logs (user_id, task_id, outcome, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(outcome)
        .bind(note)
        .bind(Utc::now().naive_utc())
        .execute(&mut **tx)
        .await
        .map_err(StorageError::Query)?;
        Ok(())
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<FeedbackRow>, StorageError> {
        sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback_logs WHERE user_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    /// Most recent entries with their task traits eagerly joined. The learner
    /// itself is order-independent; the cap keeps old signal from dominating
    /// the fetch.
    pub async fn recent_with_traits_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<FeedbackWithTraits>, StorageError> {
        sqlx::query_as::<_, FeedbackWithTraits>(
            r#"
            SELECT fb.outcome, fb.created_at,
                   t.category AS category, t.importance AS importance,
                   t.preferred_time AS preferred_time, t.energy AS energy
            FROM feedback_logs fb
            LEFT JOIN tasks t ON t.id = fb.task_id
            WHERE fb.user_id = ?1
            ORDER BY fb.created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&mut **tx)
        .await
        .map_err(StorageError::Query)
    }
}
