#[path = "support/sqlite.rs"]
mod test_support_sqlite;

use chrono::NaiveDate;

use dayplan_domain::PlanStatus;
use dayplan_storage::PlanRepository;

use test_support_sqlite::{seed_task, seed_user, setup_test_db};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

#[tokio::test]
async fn one_plan_per_user_and_date() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup_test_db().await?;
    let user_id = seed_user(&db.pool, "user@example.com").await?;
    let repo = PlanRepository::new(db.pool.clone());

    let mut tx = db.pool.begin().await?;
    let first = repo
        .get_or_create_tx(&mut tx, user_id, date(), "priority_model_v1", PlanStatus::Generated)
        .await?;
    let second = repo
        .get_or_create_tx(&mut tx, user_id, date(), "priority_model_v1", PlanStatus::Generated)
        .await?;
    tx.commit().await?;

    assert_eq!(first.id, second.id);

    // The unique constraint rejects a raw duplicate outright.
    let duplicate = sqlx::query("INSERT INTO plans (user_id, plan_date) VALUES (?1, ?2)")
        .bind(user_id)
        .bind(date())
        .execute(&db.pool)
        .await;
    assert!(duplicate.is_err(), "UNIQUE(user_id, plan_date) must hold");

    Ok(())
}

#[tokio::test]
async fn items_are_ordered_by_position_and_cascade_with_the_plan()
-> Result<(), Box<dyn std::error::Error>> {
    let db = setup_test_db().await?;
    let user_id = seed_user(&db.pool, "user@example.com").await?;
    let deadline = date().and_hms_opt(23, 59, 0).unwrap();
    let task_a = seed_task(&db.pool, user_id, "Task A", deadline).await?;
    let task_b = seed_task(&db.pool, user_id, "Task B", deadline).await?;
    let repo = PlanRepository::new(db.pool.clone());

    let mut tx = db.pool.begin().await?;
    let plan = repo
        .get_or_create_tx(&mut tx, user_id, date(), "priority_model_v1", PlanStatus::Generated)
        .await?;
    repo.insert_item_tx(
        &mut tx,
        plan.id,
        task_b,
        date().and_hms_opt(10, 0, 0).unwrap(),
        date().and_hms_opt(11, 0, 0).unwrap(),
        "later",
        1,
    )
    .await?;
    repo.insert_item_tx(
        &mut tx,
        plan.id,
        task_a,
        date().and_hms_opt(8, 0, 0).unwrap(),
        date().and_hms_opt(9, 0, 0).unwrap(),
        "earlier",
        0,
    )
    .await?;
    tx.commit().await?;

    let items = repo.items_with_titles(plan.id).await?;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].position, 0);
    assert_eq!(items[0].title.as_deref(), Some("Task A"));
    assert_eq!(items[0].source, "ai");
    assert_eq!(items[1].position, 1);

    sqlx::query("DELETE FROM plans WHERE id = ?1")
        .bind(plan.id)
        .execute(&db.pool)
        .await?;
    let mut tx = db.pool.begin().await?;
    let remaining = repo.count_items_for_task_tx(&mut tx, task_a).await?;
    tx.commit().await?;
    assert_eq!(remaining, 0, "items must cascade with their plan");

    Ok(())
}

#[tokio::test]
async fn conflict_lookup_finds_the_earliest_overlap() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup_test_db().await?;
    let user_id = seed_user(&db.pool, "user@example.com").await?;
    let deadline = date().and_hms_opt(23, 59, 0).unwrap();
    let task_a = seed_task(&db.pool, user_id, "Task A", deadline).await?;
    let task_b = seed_task(&db.pool, user_id, "Task B", deadline).await?;
    let repo = PlanRepository::new(db.pool.clone());

    let mut tx = db.pool.begin().await?;
    let plan = repo
        .get_or_create_tx(&mut tx, user_id, date(), "priority_model_v1", PlanStatus::Generated)
        .await?;
    let item_a = repo
        .insert_item_tx(
            &mut tx,
            plan.id,
            task_a,
            date().and_hms_opt(9, 0, 0).unwrap(),
            date().and_hms_opt(10, 0, 0).unwrap(),
            "",
            0,
        )
        .await?;
    repo.insert_item_tx(
        &mut tx,
        plan.id,
        task_b,
        date().and_hms_opt(10, 0, 0).unwrap(),
        date().and_hms_opt(11, 0, 0).unwrap(),
        "",
        1,
    )
    .await?;
    tx.commit().await?;

    let mut tx = db.pool.begin().await?;
    // [09:30, 10:30) overlaps both items; the earliest (Task A) wins, and the
    // moving item itself is excluded.
    let conflict = repo
        .find_conflict_tx(
            &mut tx,
            plan.id,
            -1,
            date().and_hms_opt(9, 30, 0).unwrap(),
            date().and_hms_opt(10, 30, 0).unwrap(),
        )
        .await?
        .expect("overlap expected");
    assert_eq!(conflict.title.as_deref(), Some("Task A"));

    let self_excluded = repo
        .find_conflict_tx(
            &mut tx,
            plan.id,
            item_a,
            date().and_hms_opt(9, 0, 0).unwrap(),
            date().and_hms_opt(9, 30, 0).unwrap(),
        )
        .await?;
    assert!(self_excluded.is_none());

    // Touching intervals do not conflict.
    let touching = repo
        .find_conflict_tx(
            &mut tx,
            plan.id,
            -1,
            date().and_hms_opt(11, 0, 0).unwrap(),
            date().and_hms_opt(12, 0, 0).unwrap(),
        )
        .await?;
    assert!(touching.is_none());
    tx.commit().await?;

    Ok(())
}

#[tokio::test]
async fn item_edit_moves_between_plans_and_flips_source()
-> Result<(), Box<dyn std::error::Error>> {
    let db = setup_test_db().await?;
    let user_id = seed_user(&db.pool, "user@example.com").await?;
    let deadline = date().and_hms_opt(23, 59, 0).unwrap();
    let task = seed_task(&db.pool, user_id, "Task A", deadline).await?;
    let repo = PlanRepository::new(db.pool.clone());

    let mut tx = db.pool.begin().await?;
    let monday_plan = repo
        .get_or_create_tx(&mut tx, user_id, date(), "priority_model_v1", PlanStatus::Generated)
        .await?;
    let item_id = repo
        .insert_item_tx(
            &mut tx,
            monday_plan.id,
            task,
            date().and_hms_opt(9, 0, 0).unwrap(),
            date().and_hms_opt(10, 0, 0).unwrap(),
            "",
            0,
        )
        .await?;
    let tuesday = date().succ_opt().unwrap();
    let tuesday_plan = repo
        .get_or_create_tx(&mut tx, user_id, tuesday, "priority_model_v1", PlanStatus::Adjusted)
        .await?;
    repo.apply_item_edit_tx(
        &mut tx,
        item_id,
        tuesday_plan.id,
        0,
        tuesday.and_hms_opt(9, 0, 0).unwrap(),
        tuesday.and_hms_opt(10, 0, 0).unwrap(),
    )
    .await?;
    tx.commit().await?;

    let moved = repo
        .find_item_for_user(item_id, user_id)
        .await?
        .expect("item still owned");
    assert_eq!(moved.plan_id, tuesday_plan.id);
    assert_eq!(moved.plan_date, tuesday);
    assert_eq!(moved.source, "manual");

    // Ownership check hides the item from other users.
    let other = seed_user(&db.pool, "other@example.com").await?;
    assert!(repo.find_item_for_user(item_id, other).await?.is_none());

    Ok(())
}
