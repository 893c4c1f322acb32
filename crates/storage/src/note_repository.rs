//! Note repository.

use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

use crate::StorageError;

/// Note record from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Note repository.
#[derive(Clone)]
pub struct NoteRepository {
    pool: SqlitePool,
}

impl NoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        title: &str,
        body: Option<&str>,
    ) -> Result<NoteRow, StorageError> {
        sqlx::query_as::<_, NoteRow>(
            r#"
            INSERT INTO notes (user_id, title, body, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, user_id, title, body, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(body)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<NoteRow>, StorageError> {
        sqlx::query_as::<_, NoteRow>(
            "SELECT id, user_id, title, body, created_at FROM notes WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Query)
    }
}
