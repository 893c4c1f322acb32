//! Per-item rationale rendering.
//!
//! Assembles a readable explanation from signals the scheduler already
//! computed; no new decisions are made here.

use chrono::{NaiveDateTime, Timelike};

use crate::TaskSpec;
use crate::features::FEATURE_LABELS;

/// Decision flags the scheduler observed while placing the item.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveConstraints {
    pub preferred_window: bool,
    pub deadline_binding: bool,
    pub low_conflicts: bool,
}

fn part_of_day(instant: NaiveDateTime) -> &'static str {
    match instant.hour() {
        6..=11 => "morning",
        12..=17 => "afternoon",
        _ => "evening",
    }
}

fn top_feature_phrases(top_features: &[usize]) -> Vec<&'static str> {
    top_features
        .iter()
        .filter_map(|&idx| FEATURE_LABELS.get(idx).copied())
        .collect()
}

/// Build the full rationale string for one placed item.
pub fn generate_explanation(
    task: &TaskSpec,
    user_profile: &str,
    priority: f64,
    start: NaiveDateTime,
    hours_until_deadline: f64,
    constraints: ActiveConstraints,
    top_features: &[usize],
    bias_reason: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    match task.importance.as_str() {
        "high" => parts.push("Marked as high importance.".to_string()),
        "medium" => parts.push("Moderate importance, balanced with other tasks.".to_string()),
        _ => parts.push("Lower importance, scheduled after critical items.".to_string()),
    }

    if hours_until_deadline <= 4.0 {
        parts.push("Deadline is imminent, so it was prioritized aggressively.".to_string());
    } else if hours_until_deadline <= 24.0 {
        parts.push("Due within the day, elevated in the ranking.".to_string());
    } else if hours_until_deadline <= 72.0 {
        parts.push("Due in a few days, kept near the middle of the day.".to_string());
    } else {
        parts.push("Deadline is far out, giving flexibility.".to_string());
    }

    if user_profile == "student" && task.category == "study" {
        parts.push("Study items boosted for your student profile.".to_string());
    }
    if user_profile == "worker" && (task.category == "work" || task.category == "meeting") {
        parts.push("Work/meeting tasks favored for a working profile.".to_string());
    }
    if user_profile == "entrepreneur" && (task.category == "work" || task.category == "admin") {
        parts.push("Work/admin emphasized for entrepreneurial profile.".to_string());
    }

    let scheduled_part = part_of_day(start);
    if task.preferred_time != "anytime" {
        if constraints.preferred_window {
            parts.push(format!(
                "Placed in the {scheduled_part} to match your preferred window."
            ));
        } else {
            parts.push(format!(
                "Preferred {} but scheduled in the {scheduled_part} to satisfy constraints.",
                task.preferred_time
            ));
        }
    } else {
        parts.push(format!(
            "Scheduled in the {scheduled_part} since no specific time preference was set."
        ));
    }

    if constraints.deadline_binding {
        parts.push("Slot chosen to remain before the deadline.".to_string());
    }
    if constraints.low_conflicts {
        parts.push("Position selected to reduce context switches.".to_string());
    }

    let top_phrases = top_feature_phrases(top_features);
    if !top_phrases.is_empty() {
        parts.push(format!("Key signals: {}.", top_phrases.join(", ")));
    }

    if !bias_reason.is_empty() {
        parts.push(bias_reason.to_string());
    }

    parts.push(format!(
        "Learned priority score: {priority:.1} (relative scale)."
    ));

    parts.join(" ")
}

/// The short one-line rationale surfaced next to the full explanation.
pub fn short_rationale(
    task: &TaskSpec,
    start: NaiveDateTime,
    user_profile: &str,
    priority: f64,
    bias_reason: &str,
) -> String {
    let tail = if bias_reason.is_empty() {
        "Kept preferences and deadline in mind."
    } else {
        bias_reason
    };
    format!(
        "I placed '{}' at {} because you're a {user_profile}, priority {priority:.1}. {tail}",
        task.title,
        start.format("%H:%M"),
    )
}
