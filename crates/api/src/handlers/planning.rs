//! Planning handlers: plan generation, retrieval, calendar, and item
//! mutation.
//!
//! `generate_plan` is the orchestration point: it materializes the horizon's
//! plan rows, hands eligible tasks to the allocator and day scheduler, and
//! commits every new item in a single transaction. Logical scheduling
//! failures are never errors; they surface as unscheduled tasks with a
//! reason.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};

use dayplan_domain::{
    CalendarDayOut, CalendarOut, CalendarQuery, DetailResponse, DomainError, ItemUpdateQuery,
    PlanOut, PlanQuery, PlanRequest, PlanStatus, ScheduledTaskOut, TaskStatus, UnscheduledTaskOut,
    time::parse_instant,
};
use dayplan_engine::{
    FeedbackSignal, TaskSpec, TaskTraits, allocate_tasks_to_days,
    allocator::{REASON_OUTSIDE_HORIZON, is_workday},
    day::{DayScheduleRequest, PlacedItem, schedule_day},
    load_model,
};
use dayplan_storage::{PlanItemWithTitle, SettingsRow, StorageError, TaskRow};

use crate::AppState;
use crate::handlers::tasks::task_out;
use crate::middleware::auth::AuthUser;

/// Deadline eligibility window for one planning request.
const LOOKAHEAD_DAYS: i64 = 14;
/// Planning expansion: the requested date plus up to six mask-approved days.
const HORIZON_EXPANSION_DAYS: i64 = 7;
/// The learner only ever sees this many recent feedback entries.
const FEEDBACK_FETCH_LIMIT: i64 = 500;

fn db_err(e: StorageError) -> DomainError {
    DomainError::Database(e.to_string())
}

fn sqlx_err(e: sqlx::Error) -> DomainError {
    DomainError::Database(e.to_string())
}

fn parse_hour_str(value: &str, fallback: u32) -> u32 {
    value
        .split(':')
        .next()
        .and_then(|hour| hour.parse::<u32>().ok())
        .filter(|hour| *hour <= 23)
        .unwrap_or(fallback)
}

/// Derive working hours from settings; an inverted range falls back to a
/// twelve-hour day capped at 23:00.
fn working_hours(settings: &SettingsRow) -> (u32, u32) {
    let start_hour = parse_hour_str(&settings.working_hours_start, 8);
    let mut end_hour = parse_hour_str(&settings.working_hours_end, 22);
    if end_hour <= start_hour {
        end_hour = (start_hour + 12).min(23);
    }
    (start_hour, end_hour)
}

fn task_spec(task: &TaskRow) -> TaskSpec {
    TaskSpec {
        id: task.id,
        title: task.title.clone(),
        duration_minutes: task.duration_minutes,
        deadline: task.deadline,
        category: task.category.clone(),
        importance: task.importance.clone(),
        preferred_time: task.preferred_time.clone(),
        energy: task.energy.clone(),
    }
}

fn scheduled_out(
    item: PlanItemWithTitle,
    payload: Option<&PlacedItem>,
) -> ScheduledTaskOut {
    ScheduledTaskOut {
        plan_item_id: item.id,
        task_id: item.task_id,
        title: item.title.unwrap_or_default(),
        start: item.start_datetime,
        end: item.end_datetime,
        explanation: item.explanation.unwrap_or_default(),
        priority: payload.map(|p| p.priority).unwrap_or(0.0),
        llm_explanation: payload.map(|p| p.llm_explanation.clone()),
    }
}

/// Generate or extend the plan for the requested date (and its horizon).
pub async fn generate_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<PlanRequest>,
) -> Result<Json<PlanOut>, DomainError> {
    let user = state
        .user_repo
        .get_by_id(user_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;
    let settings = state
        .user_repo
        .get_or_create_settings(user_id)
        .await
        .map_err(db_err)?;
    let (start_hour, end_hour) = working_hours(&settings);

    let start_of_day = req.date.and_hms_opt(0, 0, 0).expect("midnight is valid");
    let lookahead_end = start_of_day + Duration::days(LOOKAHEAD_DAYS);

    // The requested date is always planned; expansion days are filtered by
    // the workday mask.
    let mut horizon_dates = vec![req.date];
    for offset in 1..HORIZON_EXPANSION_DAYS {
        let date = req.date + Duration::days(offset);
        if is_workday(date, &settings.work_days_mask) {
            horizon_dates.push(date);
        }
    }

    let model = load_model(FsPath::new(&state.config.model_path))
        .map_err(|e| DomainError::Internal(anyhow::anyhow!(e)))?;

    let mut tx = state.pool.begin().await.map_err(sqlx_err)?;

    let mut plan_ids_by_date: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut existing_items_by_day: BTreeMap<NaiveDate, Vec<dayplan_storage::PlanItemRow>> =
        BTreeMap::new();
    let mut occupied_by_day: BTreeMap<NaiveDate, Vec<(NaiveDateTime, NaiveDateTime)>> =
        BTreeMap::new();
    let mut existing_minutes_by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut existing_task_ids: HashSet<i64> = HashSet::new();

    for &date in &horizon_dates {
        let plan = state
            .plan_repo
            .get_or_create_tx(
                &mut tx,
                user_id,
                date,
                &model.model_version,
                PlanStatus::Generated,
            )
            .await
            .map_err(db_err)?;
        let items = state
            .plan_repo
            .items_for_plan_tx(&mut tx, plan.id)
            .await
            .map_err(db_err)?;

        existing_task_ids.extend(items.iter().map(|item| item.task_id));
        occupied_by_day.insert(
            date,
            items
                .iter()
                .map(|item| (item.start_datetime, item.end_datetime))
                .collect(),
        );
        existing_minutes_by_day.insert(
            date,
            items
                .iter()
                .map(|item| (item.end_datetime - item.start_datetime).num_minutes())
                .sum(),
        );
        plan_ids_by_date.insert(date, plan.id);
        existing_items_by_day.insert(date, items);
    }

    // Tasks already placed anywhere in the horizon are never double-placed.
    let tasks_to_assign: Vec<TaskRow> = state
        .task_repo
        .eligible_for_planning_tx(&mut tx, user_id, start_of_day, lookahead_end)
        .await
        .map_err(db_err)?
        .into_iter()
        .filter(|task| !existing_task_ids.contains(&task.id))
        .collect();

    let any_existing = existing_items_by_day.values().any(|items| !items.is_empty());
    if tasks_to_assign.is_empty() && !any_existing {
        return Err(DomainError::Validation(
            "No pending tasks to plan for this date".to_string(),
        ));
    }

    let feedback: Vec<FeedbackSignal> = state
        .feedback_repo
        .recent_with_traits_tx(&mut tx, user_id, FEEDBACK_FETCH_LIMIT)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|row| FeedbackSignal {
            outcome: row.outcome,
            created_at: row.created_at,
            task: match (row.category, row.importance, row.preferred_time, row.energy) {
                (Some(category), Some(importance), Some(preferred_time), Some(energy)) => {
                    Some(TaskTraits {
                        category,
                        importance,
                        preferred_time,
                        energy,
                    })
                }
                _ => None,
            },
        })
        .collect();

    let specs: Vec<TaskSpec> = tasks_to_assign.iter().map(task_spec).collect();
    let allocation = allocate_tasks_to_days(
        &specs,
        &horizon_dates,
        req.date,
        &existing_minutes_by_day,
        start_hour,
        end_hour,
    );

    tracing::info!(
        user_id,
        plan_date = %req.date,
        horizon_days = horizon_dates.len(),
        eligible = tasks_to_assign.len(),
        "Generating plan"
    );

    let now = Utc::now().naive_utc();
    let mut scheduled_task_ids: HashSet<i64> = HashSet::new();
    let mut unscheduled_reasons: HashMap<i64, String> = allocation.rejected.clone();
    let mut requested_day_payload: HashMap<i64, PlacedItem> = HashMap::new();
    let mut requested_day_confidence: Option<f64> = None;

    for &date in &horizon_dates {
        let day_tasks = allocation
            .tasks_by_day
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let empty = Vec::new();
        let occupied = occupied_by_day.get(&date).unwrap_or(&empty);

        let mut placed = Vec::new();
        let mut rejected_count = 0usize;
        if !day_tasks.is_empty() {
            let outcome = schedule_day(
                &DayScheduleRequest {
                    tasks: day_tasks,
                    user_profile: user.profile.as_str(),
                    plan_date: date,
                    feedback: &feedback,
                    start_hour,
                    end_hour,
                    occupied_intervals: occupied.as_slice(),
                    now,
                },
                &model,
            );
            if date == req.date {
                requested_day_confidence = outcome.model_confidence;
            }
            for rejected in outcome.rejected {
                unscheduled_reasons.insert(rejected.task_id, rejected.reason);
                rejected_count += 1;
            }
            placed = outcome.placed;
        }

        let plan_id = plan_ids_by_date[&date];
        let existing_items = &existing_items_by_day[&date];
        let mut next_position = existing_items
            .iter()
            .map(|item| item.position)
            .max()
            .unwrap_or(-1)
            + 1;

        for item in &placed {
            let item_id = state
                .plan_repo
                .insert_item_tx(
                    &mut tx,
                    plan_id,
                    item.task_id,
                    item.start,
                    item.end,
                    &item.explanation,
                    next_position,
                )
                .await
                .map_err(db_err)?;
            next_position += 1;
            scheduled_task_ids.insert(item.task_id);
            if date == req.date {
                requested_day_payload.insert(item_id, item.clone());
            }
        }

        let total_scheduled = existing_items.len() + placed.len();
        state
            .plan_repo
            .update_summary_tx(
                &mut tx,
                plan_id,
                &format!("{total_scheduled} scheduled, {rejected_count} unscheduled"),
            )
            .await
            .map_err(db_err)?;
    }

    // Tasks behind existing items stay scheduled; newly assigned tasks flip
    // to scheduled or unscheduled.
    for items in existing_items_by_day.values() {
        for item in items {
            state
                .task_repo
                .set_status_tx(&mut tx, item.task_id, TaskStatus::Scheduled)
                .await
                .map_err(db_err)?;
        }
    }
    for task in &tasks_to_assign {
        let status = if scheduled_task_ids.contains(&task.id) {
            TaskStatus::Scheduled
        } else {
            TaskStatus::Unscheduled
        };
        state
            .task_repo
            .set_status_tx(&mut tx, task.id, status)
            .await
            .map_err(db_err)?;
    }

    tx.commit().await.map_err(sqlx_err)?;

    // Response: the requested date's full item list plus every unscheduled
    // task still ahead of that day.
    let plan = state
        .plan_repo
        .get_by_user_date(user_id, req.date)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::Database("Plan missing after commit".to_string()))?;
    let items = state
        .plan_repo
        .items_with_titles(plan.id)
        .await
        .map_err(db_err)?;
    let scheduled = items
        .into_iter()
        .map(|item| {
            let payload = requested_day_payload.get(&item.id);
            scheduled_out(item, payload)
        })
        .collect();

    let unscheduled = state
        .task_repo
        .unscheduled_since(user_id, start_of_day)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|task| {
            let reason = unscheduled_reasons
                .get(&task.id)
                .cloned()
                .unwrap_or_else(|| REASON_OUTSIDE_HORIZON.to_string());
            UnscheduledTaskOut {
                task: task_out(task),
                reason: Some(reason),
            }
        })
        .collect();

    Ok(Json(PlanOut {
        model_version: plan.model_version,
        model_confidence: requested_day_confidence,
        scheduled,
        unscheduled,
    }))
}

/// Fetch the persisted plan for one date.
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<PlanQuery>,
) -> Result<Json<PlanOut>, DomainError> {
    let plan = state
        .plan_repo
        .get_by_user_date(user_id, query.plan_date)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::NotFound("No plan found for this date".to_string()))?;

    let items = state
        .plan_repo
        .items_with_titles(plan.id)
        .await
        .map_err(db_err)?;
    let scheduled = items
        .into_iter()
        .map(|item| scheduled_out(item, None))
        .collect();

    let start_of_day = query.plan_date.and_hms_opt(0, 0, 0).expect("midnight is valid");
    let unscheduled = state
        .task_repo
        .unscheduled_since(user_id, start_of_day)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|task| UnscheduledTaskOut {
            task: task_out(task),
            reason: Some("Not placed in the last plan".to_string()),
        })
        .collect();

    Ok(Json(PlanOut {
        model_version: plan.model_version,
        model_confidence: None,
        scheduled,
        unscheduled,
    }))
}

/// Calendar view over a date range.
pub async fn calendar(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarOut>, DomainError> {
    let plans = state
        .plan_repo
        .list_between(user_id, query.start_date, query.end_date)
        .await
        .map_err(db_err)?;

    let mut days = Vec::with_capacity(plans.len());
    for plan in plans {
        let items = state
            .plan_repo
            .items_with_titles(plan.id)
            .await
            .map_err(db_err)?;
        days.push(CalendarDayOut {
            plan_date: plan.plan_date,
            model_version: plan.model_version,
            summary: plan.summary,
            scheduled: items
                .into_iter()
                .map(|item| scheduled_out(item, None))
                .collect(),
        });
    }

    Ok(Json(CalendarOut { days }))
}

/// Move or resize one plan item.
pub async fn update_plan_item(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<i64>,
    Query(query): Query<ItemUpdateQuery>,
) -> Result<Json<ScheduledTaskOut>, DomainError> {
    let item = state
        .plan_repo
        .find_item_for_user(item_id, user_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::NotFound("Plan item not found".to_string()))?;

    let start = parse_instant(&query.start).map_err(DomainError::Validation)?;
    let end = parse_instant(&query.end).map_err(DomainError::Validation)?;
    if end <= start {
        return Err(DomainError::Validation(
            "End time must be after start time.".to_string(),
        ));
    }

    let original_start = item.start_datetime;
    let new_plan_date = start.date();
    let cross_day = new_plan_date != item.plan_date;

    let mut tx = state.pool.begin().await.map_err(sqlx_err)?;

    let target_plan_id = if cross_day {
        state
            .plan_repo
            .get_by_user_date_tx(&mut tx, user_id, new_plan_date)
            .await
            .map_err(db_err)?
            .map(|plan| plan.id)
    } else {
        Some(item.plan_id)
    };

    if let Some(plan_id) = target_plan_id {
        if let Some(conflict) = state
            .plan_repo
            .find_conflict_tx(&mut tx, plan_id, item.id, start, end)
            .await
            .map_err(db_err)?
        {
            return Err(DomainError::Validation(format!(
                "Time slot already occupied by '{}' from {} to {}.",
                conflict.title.as_deref().unwrap_or("another task"),
                conflict.start_datetime.format("%H:%M"),
                conflict.end_datetime.format("%H:%M"),
            )));
        }
    }

    let (final_plan_id, position) = if cross_day {
        let plan_id = match target_plan_id {
            Some(plan_id) => plan_id,
            None => {
                // First manual move onto a day with no plan yet.
                state
                    .plan_repo
                    .get_or_create_tx(
                        &mut tx,
                        user_id,
                        new_plan_date,
                        &item.model_version,
                        PlanStatus::Adjusted,
                    )
                    .await
                    .map_err(db_err)?
                    .id
            }
        };
        (plan_id, 0)
    } else {
        (item.plan_id, item.position)
    };

    state
        .plan_repo
        .apply_item_edit_tx(&mut tx, item.id, final_plan_id, position, start, end)
        .await
        .map_err(db_err)?;
    state
        .task_repo
        .set_status_tx(&mut tx, item.task_id, TaskStatus::Scheduled)
        .await
        .map_err(db_err)?;

    // Earlier moves read as positive feedback, later as negative; a pure
    // resize emits nothing.
    if start < original_start {
        state
            .feedback_repo
            .insert_tx(
                &mut tx,
                user_id,
                Some(item.task_id),
                1,
                Some("User manually adjusted schedule"),
            )
            .await
            .map_err(db_err)?;
    } else if start > original_start {
        state
            .feedback_repo
            .insert_tx(
                &mut tx,
                user_id,
                Some(item.task_id),
                -1,
                Some("User manually adjusted schedule"),
            )
            .await
            .map_err(db_err)?;
    }

    tx.commit().await.map_err(sqlx_err)?;

    tracing::info!(user_id, item_id, cross_day, "Plan item updated");

    let title = state
        .task_repo
        .get_for_user(item.task_id, user_id)
        .await
        .map_err(db_err)?
        .map(|task| task.title)
        .unwrap_or_default();

    Ok(Json(ScheduledTaskOut {
        plan_item_id: item.id,
        task_id: item.task_id,
        title,
        start,
        end,
        explanation: item.explanation.unwrap_or_default(),
        priority: 0.0,
        llm_explanation: None,
    }))
}

/// Remove one plan item; the task falls back to unscheduled when nothing
/// references it anymore.
pub async fn delete_plan_item(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<i64>,
) -> Result<Json<DetailResponse>, DomainError> {
    let item = state
        .plan_repo
        .find_item_for_user(item_id, user_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::NotFound("Plan item not found".to_string()))?;

    let mut tx = state.pool.begin().await.map_err(sqlx_err)?;

    state
        .plan_repo
        .delete_item_tx(&mut tx, item.id)
        .await
        .map_err(db_err)?;
    let remaining = state
        .plan_repo
        .count_items_for_task_tx(&mut tx, item.task_id)
        .await
        .map_err(db_err)?;
    if remaining == 0 {
        state
            .task_repo
            .set_status_tx(&mut tx, item.task_id, TaskStatus::Unscheduled)
            .await
            .map_err(db_err)?;
    }

    tx.commit().await.map_err(sqlx_err)?;

    Ok(Json(DetailResponse {
        detail: "Removed from calendar".to_string(),
    }))
}
