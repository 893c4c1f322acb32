//! Single-day scheduling.
//!
//! Scores the day's tasks, places them in priority order, then runs one local
//! improvement pass that pulls items earlier when that strictly lowers their
//! placement cost.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::explain::{ActiveConstraints, generate_explanation, short_rationale};
use crate::features::encode_features;
use crate::feedback::{
    FeedbackSignal, bias_from_feedback, energy_key, preferred_time_key, type_importance_key,
};
use crate::model::PriorityModel;
use crate::placement::{SlotRequest, best_start_slot, placement_cost, placement_seed};
use crate::slots::{DayGrid, preferred_window};
use crate::{SLOT_MINUTES, TaskSpec};

pub const REASON_NO_WORKING_HOURS: &str = "No working hours configured for this day";
pub const REASON_DURATION_EXCEEDS_DAY: &str = "Duration exceeds available day length";
pub const REASON_NO_SLOT: &str = "No available slot before deadline/preference";

/// Everything one day's scheduling run needs.
#[derive(Debug)]
pub struct DayScheduleRequest<'a> {
    pub tasks: &'a [TaskSpec],
    pub user_profile: &'a str,
    pub plan_date: NaiveDate,
    pub feedback: &'a [FeedbackSignal],
    pub start_hour: u32,
    pub end_hour: u32,
    /// Intervals already committed to this day (existing plan items); the
    /// placement engine treats them as immovable.
    pub occupied_intervals: &'a [(NaiveDateTime, NaiveDateTime)],
    pub now: NaiveDateTime,
}

/// One placed task, with both the full and the one-line rationale.
#[derive(Debug, Clone)]
pub struct PlacedItem {
    pub task_id: i64,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub explanation: String,
    pub priority: f64,
    pub llm_explanation: String,
}

/// A task the day could not hold, with the reason.
#[derive(Debug, Clone)]
pub struct RejectedTask {
    pub task_id: i64,
    pub reason: String,
}

/// Result of one day's scheduling run.
#[derive(Debug)]
pub struct DaySchedule {
    pub placed: Vec<PlacedItem>,
    pub rejected: Vec<RejectedTask>,
    pub model_confidence: Option<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct Assignment {
    pub task_id: i64,
    pub start_idx: usize,
    pub end_idx: usize,
    pub request: SlotRequest,
}

struct ScoredTask {
    task: TaskSpec,
    priority: f64,
    hours_until_deadline: f64,
    bias: f64,
    bias_reasons: Vec<String>,
}

/// Schedule one day.
pub fn schedule_day(req: &DayScheduleRequest<'_>, model: &PriorityModel) -> DaySchedule {
    let model_confidence = model.confidence();
    let top_features = model.top_features(3);

    let mut grid = DayGrid::new(req.plan_date, req.start_hour, req.end_hour);
    if grid.is_empty() {
        let rejected = req
            .tasks
            .iter()
            .map(|t| RejectedTask {
                task_id: t.id,
                reason: REASON_NO_WORKING_HOURS.to_string(),
            })
            .collect();
        return DaySchedule {
            placed: Vec::new(),
            rejected,
            model_confidence,
        };
    }
    grid.block_intervals(req.occupied_intervals);

    let n_slots = grid.len();
    let plan_start = grid.slots[0];
    let day_end = req
        .plan_date
        .and_hms_opt(req.end_hour, 0, 0)
        .unwrap_or(plan_start);

    let learned = bias_from_feedback(req.feedback, req.now);
    let mut rng = StdRng::seed_from_u64(placement_seed(req.plan_date, req.user_profile));
    let plan_day_of_week = req.plan_date.weekday().num_days_from_monday();
    let is_weekend = plan_day_of_week >= 5;

    let mut scored: Vec<ScoredTask> = req
        .tasks
        .iter()
        .map(|task| {
            let hours_until_deadline =
                ((task.deadline - plan_start).num_seconds() as f64 / 3600.0).max(0.0);
            let features = encode_features(
                req.user_profile,
                task.duration_minutes,
                hours_until_deadline,
                &task.importance,
                &task.category,
                &task.preferred_time,
                &task.energy,
                plan_day_of_week,
                is_weekend,
            );
            let base_priority = model.predict(&features);

            let mut bias = 0.0;
            let mut bias_reasons = Vec::new();
            if let Some(value) = learned.get(&type_importance_key(&task.category, &task.importance))
            {
                bias += value;
                bias_reasons.push(format!("{} {}", task.category, task.importance));
            }
            if let Some(value) = learned.get(&preferred_time_key(&task.preferred_time)) {
                bias += value;
                if task.preferred_time != "anytime" {
                    bias_reasons.push(format!("{} time", task.preferred_time));
                } else {
                    bias_reasons.push("time preference".to_string());
                }
            }
            if let Some(value) = learned.get(&energy_key(&task.energy)) {
                bias += value;
                bias_reasons.push(format!("{} energy", task.energy));
            }

            let mut urgency_boost = 0.0;
            if hours_until_deadline < 48.0 {
                urgency_boost = (48.0 - hours_until_deadline) / 48.0 * 1.5;
                if hours_until_deadline < 24.0 {
                    urgency_boost += (24.0 - hours_until_deadline) / 24.0 * 1.5;
                }
            }
            let importance_boost = if task.importance == "high" { 0.4 } else { 0.0 };

            ScoredTask {
                task: task.clone(),
                priority: base_priority + bias + urgency_boost + importance_boost,
                hours_until_deadline,
                bias,
                bias_reasons,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.priority.total_cmp(&a.priority));

    let mut placed: Vec<PlacedItem> = Vec::new();
    let mut rejected: Vec<RejectedTask> = Vec::new();
    let mut assignments: Vec<Assignment> = Vec::new();

    for item in &scored {
        let task = &item.task;
        let required_slots =
            ((task.duration_minutes + SLOT_MINUTES - 1) / SLOT_MINUTES).max(1) as usize;

        if required_slots > n_slots {
            rejected.push(RejectedTask {
                task_id: task.id,
                reason: REASON_DURATION_EXCEEDS_DAY.to_string(),
            });
            continue;
        }

        let latest_end = day_end.min(task.deadline);
        let slot_request = SlotRequest {
            required_slots,
            latest_end,
            preferred_window: preferred_window(
                &task.preferred_time,
                n_slots,
                req.start_hour,
                req.end_hour,
            ),
            energy: task.energy.clone(),
            duration_minutes: task.duration_minutes,
            hours_until_deadline: item.hours_until_deadline,
        };

        let Some(best_start) = best_start_slot(&grid, &slot_request, learned.strength, &mut rng)
        else {
            rejected.push(RejectedTask {
                task_id: task.id,
                reason: REASON_NO_SLOT.to_string(),
            });
            continue;
        };

        let end_idx = best_start + required_slots;
        grid.claim(best_start, end_idx, task.id);

        let start = grid.slots[best_start];
        let end = start + Duration::minutes(task.duration_minutes);

        let constraints = ActiveConstraints {
            preferred_window: best_start >= slot_request.preferred_window.0
                && best_start < slot_request.preferred_window.1,
            deadline_binding: end >= task.deadline - Duration::hours(1),
            low_conflicts: true,
        };

        let bias_text = if item.bias.abs() > 0.0 && !item.bias_reasons.is_empty() {
            let direction = if item.bias > 0.0 { "earlier" } else { "later" };
            format!(
                "Personalization: adjusted {direction} based on your feedback for {}.",
                item.bias_reasons.join(", ")
            )
        } else {
            String::new()
        };

        let explanation = generate_explanation(
            task,
            req.user_profile,
            item.priority,
            start,
            item.hours_until_deadline,
            constraints,
            &top_features,
            &bias_text,
        );
        let llm_explanation =
            short_rationale(task, start, req.user_profile, item.priority, &bias_text);

        placed.push(PlacedItem {
            task_id: task.id,
            title: task.title.clone(),
            start,
            end,
            explanation,
            priority: item.priority,
            llm_explanation,
        });
        assignments.push(Assignment {
            task_id: task.id,
            start_idx: best_start,
            end_idx,
            request: slot_request,
        });
    }

    shift_earlier(&mut assignments, &mut grid);

    // Reflect any shifts; final intervals are slot-aligned.
    for item in &mut placed {
        if let Some(assignment) = assignments.iter().find(|a| a.task_id == item.task_id) {
            item.start = grid.slots[assignment.start_idx];
            item.end = grid.slots[assignment.end_idx - 1] + Duration::minutes(SLOT_MINUTES);
        }
    }

    DaySchedule {
        placed,
        rejected,
        model_confidence,
    }
}

/// Local improvement: walk placed tasks in insertion order and move each to
/// the first earlier start whose cost is strictly lower.
pub(crate) fn shift_earlier(assignments: &mut [Assignment], grid: &mut DayGrid) {
    let n_slots = grid.len();
    for i in 0..assignments.len() {
        let assignment = assignments[i].clone();
        let required_slots = assignment.request.required_slots;

        // Cost comparisons treat this task's own slots as free.
        grid.release(assignment.task_id);
        let current_cost = placement_cost(grid, assignment.start_idx, &assignment.request);

        let mut chosen = assignment.start_idx;
        for start_idx in 0..assignment.start_idx {
            let end_idx = start_idx + required_slots;
            if end_idx > n_slots || grid.slots[end_idx - 1] >= assignment.request.latest_end {
                break;
            }
            if !grid.is_free_range(start_idx, end_idx) {
                continue;
            }
            if placement_cost(grid, start_idx, &assignment.request) < current_cost {
                chosen = start_idx;
                break;
            }
        }

        grid.claim(chosen, chosen + required_slots, assignment.task_id);
        assignments[i].start_idx = chosen;
        assignments[i].end_idx = chosen + required_slots;
    }
}
