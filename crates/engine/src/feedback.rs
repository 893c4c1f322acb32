//! Feedback-to-bias learner.
//!
//! Turns the recent manual-adjustment log into additive scoring biases. Each
//! entry decays with a 14-day half-life; the aggregate weight saturates into
//! a strength scalar that gates how hard personalization is applied.

use std::collections::HashMap;

use chrono::NaiveDateTime;

const HALF_LIFE_DAYS: f64 = 14.0;
const STRENGTH_SATURATION: f64 = 8.0;

/// The task attributes a feedback entry is linked to.
#[derive(Debug, Clone)]
pub struct TaskTraits {
    pub category: String,
    pub importance: String,
    pub preferred_time: String,
    pub energy: String,
}

/// One feedback-log entry as the learner sees it. Entries without a linked
/// task carry no trainable signal and are skipped.
#[derive(Debug, Clone)]
pub struct FeedbackSignal {
    pub outcome: i32,
    pub created_at: NaiveDateTime,
    pub task: Option<TaskTraits>,
}

/// Learned personalization: signed bias per key, and the overall strength in
/// [0, 1] already folded into each value.
#[derive(Debug, Clone, Default)]
pub struct LearnedBias {
    pub map: HashMap<String, f64>,
    pub strength: f64,
}

impl LearnedBias {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.map.get(key).copied()
    }
}

pub fn type_importance_key(category: &str, importance: &str) -> String {
    format!("type_importance:{category}:{importance}")
}

pub fn preferred_time_key(preferred_time: &str) -> String {
    format!("preferred_time:{preferred_time}")
}

pub fn energy_key(energy: &str) -> String {
    format!("energy:{energy}")
}

/// Learn biases from the feedback log. Order-independent; callers are
/// responsible for trimming to the most recent entries (the store caps at
/// 500).
pub fn bias_from_feedback(feedback: &[FeedbackSignal], now: NaiveDateTime) -> LearnedBias {
    if feedback.is_empty() {
        return LearnedBias::default();
    }

    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut weights: HashMap<String, f64> = HashMap::new();
    let mut total_weight = 0.0;

    for entry in feedback {
        let Some(task) = &entry.task else { continue };
        if entry.outcome == 0 {
            continue;
        }
        let age_days = ((now - entry.created_at).num_seconds() as f64 / 86_400.0).max(0.0);
        let weight = (-age_days / HALF_LIFE_DAYS).exp();
        total_weight += weight;

        let keys = [
            type_importance_key(&task.category, &task.importance),
            preferred_time_key(&task.preferred_time),
            energy_key(&task.energy),
        ];
        for key in keys {
            *totals.entry(key.clone()).or_insert(0.0) += entry.outcome as f64 * weight;
            *weights.entry(key).or_insert(0.0) += weight;
        }
    }

    let strength = if total_weight > 0.0 {
        (total_weight / STRENGTH_SATURATION).min(1.0)
    } else {
        0.0
    };
    if strength <= 0.0 {
        return LearnedBias::default();
    }

    let mut map = HashMap::new();
    for (key, total) in totals {
        let weight = weights.get(&key).copied().unwrap_or(0.0);
        if weight <= 0.0 {
            continue;
        }
        map.insert(key, 2.0 * (total / weight) * strength);
    }

    LearnedBias { map, strength }
}
