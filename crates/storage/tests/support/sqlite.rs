use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
static COUNTER: AtomicU64 = AtomicU64::new(1);

pub struct SqliteTestDb {
    pub pool: SqlitePool,
    pub db_path: PathBuf,
    keep_db: bool,
}

impl Drop for SqliteTestDb {
    fn drop(&mut self) {
        if self.keep_db {
            return;
        }

        let _ = std::fs::remove_file(&self.db_path);
    }
}

pub async fn setup_test_db() -> Result<SqliteTestDb, sqlx::Error> {
    let keep_db = std::env::var("TEST_KEEP_DB").ok().as_deref() == Some("1");
    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    let db_path = std::env::temp_dir().join(format!(
        "dayplan-storage-sqlite-test-{}-{}.db",
        std::process::id(),
        unique
    ));

    if db_path.exists() {
        let _ = std::fs::remove_file(&db_path);
    }

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;

    Ok(SqliteTestDb {
        pool,
        db_path,
        keep_db,
    })
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("sqlite migration failed: {e}")))
}

/// Insert one user and return its id.
pub async fn seed_user(pool: &SqlitePool, email: &str) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO users (email, name, profile, hashed_password) VALUES (?1, ?2, 'worker', 'not-used') RETURNING id",
    )
    .bind(email)
    .bind("Test User")
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

/// Insert one pending task and return its id.
pub async fn seed_task(
    pool: &SqlitePool,
    user_id: i64,
    title: &str,
    deadline: chrono::NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tasks
            (user_id, title, duration_minutes, deadline, category, importance,
             preferred_time, energy, status)
        VALUES (?1, ?2, 60, ?3, 'work', 'high', 'morning', 'high', 'pending')
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(deadline)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
