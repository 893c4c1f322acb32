//! Feedback log schemas.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Feedback creation request. `+1` means the user wanted the task earlier or
/// higher, `-1` later or lower; the handler rejects anything else.
#[derive(Debug, Deserialize)]
pub struct FeedbackCreate {
    pub task_id: Option<i64>,
    pub outcome: i32,
    pub note: Option<String>,
}

/// Feedback response.
#[derive(Debug, Serialize)]
pub struct FeedbackOut {
    pub id: i64,
    pub task_id: Option<i64>,
    pub outcome: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}
