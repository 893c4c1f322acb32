//! Task types and lifecycle enums.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::time::flexible_instant;

/// Task lifecycle. `completed` is terminal and never touched by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Scheduled,
    Completed,
    Unscheduled,
}

/// Plan lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanStatus {
    Generated,
    Adjusted,
    Archived,
}

/// User profile; feeds the feature encoder and explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserProfile {
    Student,
    Worker,
    Entrepreneur,
}

impl UserProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserProfile::Student => "student",
            UserProfile::Worker => "worker",
            UserProfile::Entrepreneur => "entrepreneur",
        }
    }
}

/// Task creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskCreate {
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "duration must be positive"))]
    pub duration_minutes: i64,
    #[serde(deserialize_with = "flexible_instant::deserialize")]
    pub deadline: NaiveDateTime,
    pub category: String,
    pub importance: String,
    pub preferred_time: String,
    pub energy: String,
}

/// Task response.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOut {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub deadline: NaiveDateTime,
    pub category: String,
    pub importance: String,
    pub preferred_time: String,
    pub energy: String,
    pub status: TaskStatus,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Task response annotated with the reason it was not placed.
#[derive(Debug, Clone, Serialize)]
pub struct UnscheduledTaskOut {
    #[serde(flatten)]
    pub task: TaskOut,
    pub reason: Option<String>,
}
