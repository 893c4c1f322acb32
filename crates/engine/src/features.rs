//! Feature encoding for the priority predictor.
//!
//! The predictor was trained against vectors in exactly this order; changing
//! it invalidates every saved artifact.

/// Number of features the predictor consumes.
pub const FEATURE_COUNT: usize = 9;

/// Human-readable labels for each feature index, used by the explanation
/// builder when surfacing the predictor's top signals.
pub const FEATURE_LABELS: [&str; FEATURE_COUNT] = [
    "user profile affinity",
    "shorter duration",
    "deadline proximity",
    "task importance",
    "task category",
    "preferred time",
    "energy requirement",
    "day-of-week fit",
    "weekend/weekday context",
];

fn user_type_index(user_type: &str) -> f64 {
    match user_type {
        "student" => 0.0,
        "worker" => 1.0,
        "entrepreneur" => 2.0,
        _ => 0.0,
    }
}

fn importance_index(importance: &str) -> f64 {
    match importance {
        "low" => 0.0,
        "medium" => 1.0,
        "high" => 2.0,
        _ => 1.0,
    }
}

fn category_index(category: &str) -> f64 {
    match category {
        "study" => 0.0,
        "work" => 1.0,
        "meeting" => 2.0,
        "personal" => 3.0,
        "social" => 4.0,
        "admin" => 5.0,
        _ => 0.0,
    }
}

fn preferred_time_index(preferred_time: &str) -> f64 {
    match preferred_time {
        "morning" => 0.0,
        "afternoon" => 1.0,
        "evening" => 2.0,
        "anytime" => 3.0,
        _ => 3.0,
    }
}

fn energy_index(energy: &str) -> f64 {
    match energy {
        "low" => 0.0,
        "medium" => 1.0,
        "high" => 2.0,
        _ => 1.0,
    }
}

/// Encode a task plus its scheduling context into the fixed feature vector.
#[allow(clippy::too_many_arguments)]
pub fn encode_features(
    user_type: &str,
    duration_minutes: i64,
    hours_until_deadline: f64,
    importance: &str,
    category: &str,
    preferred_time: &str,
    energy: &str,
    plan_day_of_week: u32,
    is_weekend: bool,
) -> [f64; FEATURE_COUNT] {
    [
        user_type_index(user_type),
        duration_minutes as f64,
        hours_until_deadline.max(0.0),
        importance_index(importance),
        category_index(category),
        preferred_time_index(preferred_time),
        energy_index(energy),
        plan_day_of_week as f64,
        if is_weekend { 1.0 } else { 0.0 },
    ]
}
