//! User and settings repository.

use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

use dayplan_domain::UserProfile;

use crate::StorageError;

/// User record from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub profile: UserProfile,
    pub timezone: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub last_login_at: Option<NaiveDateTime>,
}

/// User settings record from database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingsRow {
    pub id: i64,
    pub user_id: i64,
    pub working_hours_start: String,
    pub working_hours_end: String,
    pub work_days_mask: String,
    pub default_planning_horizon_hours: i64,
    pub notifications_enabled: bool,
}

/// User repository.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user. Fails on duplicate email (unique constraint).
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        profile: UserProfile,
        hashed_password: &str,
    ) -> Result<UserRow, StorageError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, name, profile, hashed_password, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, email, name, profile, timezone, hashed_password, is_active,
                      created_at, last_login_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(profile)
        .bind(hashed_password)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, StorageError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, profile, timezone, hashed_password, is_active,
                   created_at, last_login_at
            FROM users WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserRow>, StorageError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, profile, timezone, hashed_password, is_active,
                   created_at, last_login_at
            FROM users WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Query)
    }

    pub async fn touch_last_login(&self, id: i64) -> Result<(), StorageError> {
        sqlx::query("UPDATE users SET last_login_at = ?1 WHERE id = ?2")
            .bind(Utc::now().naive_utc())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Query)?;
        Ok(())
    }

    /// Load the user's settings, creating the default row on first use.
    ///
    /// The insert is an atomic no-op upsert, so concurrent first requests for
    /// the same user cannot race into a duplicate.
    pub async fn get_or_create_settings(&self, user_id: i64) -> Result<SettingsRow, StorageError> {
        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id) VALUES (?1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Query)?;

        sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT id, user_id, working_hours_start, working_hours_end, work_days_mask,
                   default_planning_horizon_hours, notifications_enabled
            FROM user_settings WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Query)
    }
}
