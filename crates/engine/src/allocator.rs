//! Horizon allocation.
//!
//! Distributes pending tasks across the planning horizon before any intra-day
//! placement happens. Spreads far-deadline load toward later days while
//! keeping near-deadline days from being over-filled early.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::TaskSpec;

pub const REASON_OUTSIDE_HORIZON: &str = "Deadline outside horizon";

/// Result of distributing tasks across the horizon.
#[derive(Debug, Default)]
pub struct HorizonAllocation {
    pub tasks_by_day: BTreeMap<NaiveDate, Vec<TaskSpec>>,
    pub minutes_by_day: BTreeMap<NaiveDate, i64>,
    pub rejected: HashMap<i64, String>,
}

fn importance_rank(importance: &str) -> u8 {
    match importance {
        "high" => 0,
        "medium" => 1,
        "low" => 2,
        _ => 1,
    }
}

/// Assign each task to one horizon day, or reject it when its deadline falls
/// before every candidate day.
pub fn allocate_tasks_to_days(
    tasks: &[TaskSpec],
    horizon_dates: &[NaiveDate],
    plan_start_date: NaiveDate,
    existing_minutes_by_day: &BTreeMap<NaiveDate, i64>,
    start_hour: u32,
    end_hour: u32,
) -> HorizonAllocation {
    let mut allocation = HorizonAllocation::default();
    for &day in horizon_dates {
        allocation.tasks_by_day.insert(day, Vec::new());
        allocation.minutes_by_day.insert(day, 0);
    }

    if horizon_dates.is_empty() {
        for task in tasks {
            allocation
                .rejected
                .insert(task.id, REASON_OUTSIDE_HORIZON.to_string());
        }
        return allocation;
    }

    let day_capacity_minutes = ((end_hour as i64 - start_hour as i64) * 60).max(1) as f64;

    let mut ordered: Vec<&TaskSpec> = tasks.iter().collect();
    ordered.sort_by_key(|t| (t.deadline, importance_rank(&t.importance)));

    for task in ordered {
        let deadline_date = task.deadline.date();
        let candidates: Vec<NaiveDate> = horizon_dates
            .iter()
            .copied()
            .filter(|&day| day <= deadline_date)
            .collect();
        if candidates.is_empty() {
            allocation
                .rejected
                .insert(task.id, REASON_OUTSIDE_HORIZON.to_string());
            continue;
        }

        let far_deadline = (deadline_date - plan_start_date).num_days() >= 4;
        let mut best_day: Option<NaiveDate> = None;
        let mut best_score = f64::INFINITY;

        for day in candidates {
            let load_minutes = existing_minutes_by_day.get(&day).copied().unwrap_or(0)
                + allocation.minutes_by_day.get(&day).copied().unwrap_or(0);
            let load_ratio = load_minutes as f64 / day_capacity_minutes;
            let load_penalty = load_ratio * load_ratio * 8.0;

            let days_until_deadline = (deadline_date - day).num_days().max(0);
            let deadline_penalty = if days_until_deadline <= 1 {
                0.0
            } else {
                (days_until_deadline as f64 * 0.6).min(6.0)
            };

            let horizon_offset = (day - plan_start_date).num_days();
            let early_if_far_penalty = if far_deadline && horizon_offset <= 1 {
                2.5
            } else {
                0.0
            };

            let score = load_penalty + deadline_penalty + early_if_far_penalty;

            match best_day {
                None => {
                    best_score = score;
                    best_day = Some(day);
                }
                Some(_) if score < best_score => {
                    best_score = score;
                    best_day = Some(day);
                }
                Some(current) if score == best_score => {
                    // Equal cost: push far-deadline work later, near-deadline
                    // work earlier.
                    if far_deadline {
                        if day > current {
                            best_day = Some(day);
                        }
                    } else if day < current {
                        best_day = Some(day);
                    }
                }
                Some(_) => {}
            }
        }

        match best_day {
            Some(day) => {
                allocation
                    .tasks_by_day
                    .get_mut(&day)
                    .expect("horizon day present")
                    .push(task.clone());
                *allocation.minutes_by_day.get_mut(&day).expect("horizon day present") +=
                    task.duration_minutes;
            }
            None => {
                allocation
                    .rejected
                    .insert(task.id, REASON_OUTSIDE_HORIZON.to_string());
            }
        }
    }

    allocation
}

/// Working-day check against the seven-character Monday-first mask. Malformed
/// masks never block planning.
pub fn is_workday(date: NaiveDate, mask: &str) -> bool {
    if mask.len() < 7 {
        return true;
    }
    let idx = date.weekday().num_days_from_monday() as usize;
    mask.as_bytes().get(idx).map(|&b| b == b'1').unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn task(id: i64, deadline: chrono::NaiveDateTime, duration: i64, importance: &str) -> TaskSpec {
        TaskSpec {
            id,
            title: format!("Task {id}"),
            duration_minutes: duration,
            deadline,
            category: "work".to_string(),
            importance: importance.to_string(),
            preferred_time: "anytime".to_string(),
            energy: "medium".to_string(),
        }
    }

    fn horizon(days: i64) -> Vec<NaiveDate> {
        (0..days).map(|d| monday() + Duration::days(d)).collect()
    }

    #[test]
    fn heavy_far_deadline_load_spreads_across_days() {
        let deadline = (monday() + Duration::days(6)).and_hms_opt(17, 0, 0).unwrap();
        let tasks: Vec<TaskSpec> = (0..4).map(|i| task(i, deadline, 240, "medium")).collect();
        let existing = BTreeMap::new();

        let allocation =
            allocate_tasks_to_days(&tasks, &horizon(7), monday(), &existing, 8, 22);

        let days_with_tasks = allocation
            .tasks_by_day
            .values()
            .filter(|tasks| !tasks.is_empty())
            .count();
        assert!(days_with_tasks >= 2);
        assert!(allocation.rejected.is_empty());
    }

    #[test]
    fn near_deadline_tasks_land_on_early_days() {
        let deadline = monday().and_hms_opt(23, 59, 0).unwrap();
        let tasks = vec![task(1, deadline, 60, "high")];
        let existing = BTreeMap::new();

        let allocation =
            allocate_tasks_to_days(&tasks, &horizon(7), monday(), &existing, 8, 18);

        assert_eq!(allocation.tasks_by_day[&monday()].len(), 1);
    }

    #[test]
    fn far_deadline_tasks_avoid_the_first_two_days() {
        let deadline = (monday() + Duration::days(6)).and_hms_opt(12, 0, 0).unwrap();
        let tasks = vec![task(1, deadline, 60, "medium")];
        let existing = BTreeMap::new();

        let allocation =
            allocate_tasks_to_days(&tasks, &horizon(7), monday(), &existing, 8, 18);

        let (assigned_day, _) = allocation
            .tasks_by_day
            .iter()
            .find(|(_, tasks)| !tasks.is_empty())
            .unwrap();
        assert!((*assigned_day - monday()).num_days() >= 2);
    }

    #[test]
    fn deadline_before_horizon_is_rejected() {
        let deadline = (monday() - Duration::days(1)).and_hms_opt(12, 0, 0).unwrap();
        let tasks = vec![task(7, deadline, 60, "high")];
        let existing = BTreeMap::new();

        let allocation =
            allocate_tasks_to_days(&tasks, &horizon(7), monday(), &existing, 8, 18);

        assert_eq!(
            allocation.rejected.get(&7).map(String::as_str),
            Some(REASON_OUTSIDE_HORIZON)
        );
    }

    #[test]
    fn empty_horizon_rejects_everything() {
        let deadline = monday().and_hms_opt(12, 0, 0).unwrap();
        let tasks = vec![task(1, deadline, 60, "high"), task(2, deadline, 30, "low")];
        let existing = BTreeMap::new();

        let allocation = allocate_tasks_to_days(&tasks, &[], monday(), &existing, 8, 18);

        assert_eq!(allocation.rejected.len(), 2);
    }

    #[test]
    fn urgent_important_tasks_are_allocated_first() {
        // Same deadline: high importance wins the earlier (less loaded) day
        // when capacity forces a split.
        let deadline = (monday() + Duration::days(1)).and_hms_opt(23, 0, 0).unwrap();
        let mut existing = BTreeMap::new();
        existing.insert(monday(), 0_i64);
        let tasks = vec![
            task(1, deadline, 300, "low"),
            task(2, deadline, 300, "high"),
        ];

        let allocation =
            allocate_tasks_to_days(&tasks, &horizon(2), monday(), &existing, 8, 18);

        // The high-importance task is placed before the low one and therefore
        // sees the emptier first day.
        assert!(allocation.tasks_by_day[&monday()]
            .iter()
            .any(|t| t.id == 2));
        assert!(allocation.rejected.is_empty());
    }

    #[test]
    fn workday_mask_is_monday_first() {
        assert!(is_workday(monday(), "1111111"));
        assert!(!is_workday(monday(), "0111111"));
        let saturday = monday() + Duration::days(5);
        assert!(!is_workday(saturday, "1111100"));
        assert!(is_workday(saturday, "1111111"));
        // Malformed masks never block.
        assert!(is_workday(monday(), "101"));
    }
}
