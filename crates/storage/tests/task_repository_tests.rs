#[path = "support/sqlite.rs"]
mod test_support_sqlite;

use chrono::{Duration, NaiveDate};

use dayplan_domain::TaskStatus;
use dayplan_storage::TaskRepository;

use test_support_sqlite::{seed_task, seed_user, setup_test_db};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

#[tokio::test]
async fn eligibility_respects_window_and_status() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup_test_db().await?;
    let user_id = seed_user(&db.pool, "user@example.com").await?;
    let repo = TaskRepository::new(db.pool.clone());

    let window_start = date().and_hms_opt(0, 0, 0).unwrap();
    let window_end = window_start + Duration::days(14);

    let in_window = seed_task(&db.pool, user_id, "In window", window_start + Duration::days(2)).await?;
    let late = seed_task(&db.pool, user_id, "Too late", window_start + Duration::days(20)).await?;
    let done = seed_task(&db.pool, user_id, "Done", window_start + Duration::days(1)).await?;
    repo.set_status(done, TaskStatus::Completed).await?;
    let unscheduled =
        seed_task(&db.pool, user_id, "Retry me", window_start + Duration::days(3)).await?;
    repo.set_status(unscheduled, TaskStatus::Unscheduled).await?;

    let mut tx = db.pool.begin().await?;
    let eligible = repo
        .eligible_for_planning_tx(&mut tx, user_id, window_start, window_end)
        .await?;
    tx.commit().await?;

    let ids: Vec<i64> = eligible.iter().map(|t| t.id).collect();
    assert!(ids.contains(&in_window));
    assert!(ids.contains(&unscheduled), "unscheduled tasks are retried");
    assert!(!ids.contains(&late), "outside the 14-day window");
    assert!(!ids.contains(&done), "completed is terminal");

    Ok(())
}

#[tokio::test]
async fn unscheduled_since_filters_past_deadlines() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup_test_db().await?;
    let user_id = seed_user(&db.pool, "user@example.com").await?;
    let repo = TaskRepository::new(db.pool.clone());

    let start_of_day = date().and_hms_opt(0, 0, 0).unwrap();
    let ahead = seed_task(&db.pool, user_id, "Ahead", start_of_day + Duration::hours(10)).await?;
    let behind = seed_task(&db.pool, user_id, "Behind", start_of_day - Duration::hours(1)).await?;
    repo.set_status(ahead, TaskStatus::Unscheduled).await?;
    repo.set_status(behind, TaskStatus::Unscheduled).await?;

    let rows = repo.unscheduled_since(user_id, start_of_day).await?;
    let ids: Vec<i64> = rows.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![ahead]);

    Ok(())
}

#[tokio::test]
async fn status_round_trips_as_lowercase_text() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup_test_db().await?;
    let user_id = seed_user(&db.pool, "user@example.com").await?;
    let repo = TaskRepository::new(db.pool.clone());
    let task = seed_task(
        &db.pool,
        user_id,
        "Task",
        date().and_hms_opt(12, 0, 0).unwrap(),
    )
    .await?;

    repo.set_status(task, TaskStatus::Scheduled).await?;

    let raw: (String,) = sqlx::query_as("SELECT status FROM tasks WHERE id = ?1")
        .bind(task)
        .fetch_one(&db.pool)
        .await?;
    assert_eq!(raw.0, "scheduled");

    let row = repo.get_for_user(task, user_id).await?.unwrap();
    assert_eq!(row.status, TaskStatus::Scheduled);

    Ok(())
}
