//! Plan and plan-item repository.
//!
//! All plan mutation happens inside the caller's transaction so a planning
//! request either persists every new item in the horizon or none of them.
//! Plan uniqueness per (user, date) is enforced by the schema; the idempotent
//! insert below makes racing requests converge on the same row.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use dayplan_domain::PlanStatus;

use crate::StorageError;

/// Plan record from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanRow {
    pub id: i64,
    pub user_id: i64,
    pub plan_date: NaiveDate,
    pub model_version: String,
    pub status: PlanStatus,
    pub summary: Option<String>,
}

/// Plan item record from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanItemRow {
    pub id: i64,
    pub plan_id: i64,
    pub task_id: i64,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub explanation: Option<String>,
    pub position: i64,
    pub source: String,
}

/// Plan item joined with its task's title for response assembly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanItemWithTitle {
    pub id: i64,
    pub plan_id: i64,
    pub task_id: i64,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub explanation: Option<String>,
    pub position: i64,
    pub source: String,
    pub title: Option<String>,
}

/// Plan item joined with its owning plan, for ownership checks on mutation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemWithPlan {
    pub id: i64,
    pub plan_id: i64,
    pub task_id: i64,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub explanation: Option<String>,
    pub position: i64,
    pub source: String,
    pub plan_user_id: i64,
    pub plan_date: NaiveDate,
    pub model_version: String,
}

/// The earliest item conflicting with a proposed interval.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConflictRow {
    pub title: Option<String>,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
}

const PLAN_COLUMNS: &str = "id, user_id, plan_date, model_version, status, summary";
const ITEM_COLUMNS: &str =
    "id, plan_id, task_id, start_datetime, end_datetime, explanation, position, source";

/// Plan repository.
#[derive(Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_user_date(
        &self,
        user_id: i64,
        plan_date: NaiveDate,
    ) -> Result<Option<PlanRow>, StorageError> {
        sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE user_id = ?1 AND plan_date = ?2"
        ))
        .bind(user_id)
        .bind(plan_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn get_by_user_date_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        plan_date: NaiveDate,
    ) -> Result<Option<PlanRow>, StorageError> {
        sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE user_id = ?1 AND plan_date = ?2"
        ))
        .bind(user_id)
        .bind(plan_date)
        .fetch_optional(&mut **tx)
        .await
        .map_err(StorageError::Query)
    }

    /// Load or create the plan row for one (user, date). Idempotent: the
    /// no-op upsert plus the unique constraint make concurrent requests for
    /// the same date converge on a single row.
    pub async fn get_or_create_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        plan_date: NaiveDate,
        model_version: &str,
        status: PlanStatus,
    ) -> Result<PlanRow, StorageError> {
        sqlx::query(
            r#"
            INSERT INTO plans (user_id, plan_date, model_version, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (user_id, plan_date) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(plan_date)
        .bind(model_version)
        .bind(status)
        .bind(Utc::now().naive_utc())
        .execute(&mut **tx)
        .await
        .map_err(StorageError::Query)?;

        sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE user_id = ?1 AND plan_date = ?2"
        ))
        .bind(user_id)
        .bind(plan_date)
        .fetch_one(&mut **tx)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn list_between(
        &self,
        user_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PlanRow>, StorageError> {
        sqlx::query_as::<_, PlanRow>(&format!(
            r#"
            SELECT {PLAN_COLUMNS} FROM plans
            WHERE user_id = ?1 AND plan_date >= ?2 AND plan_date <= ?3
            ORDER BY plan_date ASC
            "#
        ))
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn items_for_plan_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        plan_id: i64,
    ) -> Result<Vec<PlanItemRow>, StorageError> {
        sqlx::query_as::<_, PlanItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM plan_items WHERE plan_id = ?1 ORDER BY position ASC"
        ))
        .bind(plan_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(StorageError::Query)
    }

    /// Items of one plan with task titles, ordered by position.
    pub async fn items_with_titles(
        &self,
        plan_id: i64,
    ) -> Result<Vec<PlanItemWithTitle>, StorageError> {
        sqlx::query_as::<_, PlanItemWithTitle>(
            r#"
            SELECT pi.id, pi.plan_id, pi.task_id, pi.start_datetime, pi.end_datetime,
                   pi.explanation, pi.position, pi.source, t.title AS title
            FROM plan_items pi
            LEFT JOIN tasks t ON t.id = pi.task_id
            WHERE pi.plan_id = ?1
            ORDER BY pi.position ASC
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn insert_item_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        plan_id: i64,
        task_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
        explanation: &str,
        position: i64,
    ) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO plan_items
                (plan_id, task_id, start_datetime, end_datetime, explanation, position, source)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'ai')
            RETURNING id
            "#,
        )
        .bind(plan_id)
        .bind(task_id)
        .bind(start)
        .bind(end)
        .bind(explanation)
        .bind(position)
        .fetch_one(&mut **tx)
        .await
        .map_err(StorageError::Query)?;
        Ok(row.0)
    }

    pub async fn update_summary_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        plan_id: i64,
        summary: &str,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE plans SET summary = ?1 WHERE id = ?2")
            .bind(summary)
            .bind(plan_id)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::Query)?;
        Ok(())
    }

    /// Find one item, constrained to the owning user.
    pub async fn find_item_for_user(
        &self,
        item_id: i64,
        user_id: i64,
    ) -> Result<Option<ItemWithPlan>, StorageError> {
        sqlx::query_as::<_, ItemWithPlan>(
            r#"
            SELECT pi.id, pi.plan_id, pi.task_id, pi.start_datetime, pi.end_datetime,
                   pi.explanation, pi.position, pi.source,
                   p.user_id AS plan_user_id, p.plan_date AS plan_date,
                   p.model_version AS model_version
            FROM plan_items pi
            JOIN plans p ON p.id = pi.plan_id
            WHERE pi.id = ?1 AND p.user_id = ?2
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    /// Earliest item in the plan overlapping `[start, end)`, excluding the
    /// item being moved.
    pub async fn find_conflict_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        plan_id: i64,
        exclude_item_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Option<ConflictRow>, StorageError> {
        sqlx::query_as::<_, ConflictRow>(
            r#"
            SELECT t.title AS title, pi.start_datetime, pi.end_datetime
            FROM plan_items pi
            LEFT JOIN tasks t ON t.id = pi.task_id
            WHERE pi.plan_id = ?1
              AND pi.id != ?2
              AND pi.start_datetime < ?3
              AND pi.end_datetime > ?4
            ORDER BY pi.start_datetime ASC
            LIMIT 1
            "#,
        )
        .bind(plan_id)
        .bind(exclude_item_id)
        .bind(end)
        .bind(start)
        .fetch_optional(&mut **tx)
        .await
        .map_err(StorageError::Query)
    }

    /// Rewrite an item after a manual edit: interval, owning plan, position,
    /// and the manual source tag.
    pub async fn apply_item_edit_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        item_id: i64,
        plan_id: i64,
        position: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            UPDATE plan_items
            SET plan_id = ?1, position = ?2, start_datetime = ?3, end_datetime = ?4,
                source = 'manual'
            WHERE id = ?5
            "#,
        )
        .bind(plan_id)
        .bind(position)
        .bind(start)
        .bind(end)
        .bind(item_id)
        .execute(&mut **tx)
        .await
        .map_err(StorageError::Query)?;
        Ok(())
    }

    pub async fn delete_item_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        item_id: i64,
    ) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM plan_items WHERE id = ?1")
            .bind(item_id)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::Query)?;
        Ok(())
    }

    /// Remaining items referencing a task, across every plan.
    pub async fn count_items_for_task_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        task_id: i64,
    ) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plan_items WHERE task_id = ?1")
            .bind(task_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(StorageError::Query)?;
        Ok(row.0)
    }
}
