//! Planning engine.
//!
//! Pure CPU: scoring, slot search, placement, horizon allocation, and the
//! feedback-to-bias learner. Persistence and HTTP live elsewhere; everything
//! here is deterministic given its inputs (the exploration RNG is seeded from
//! the plan date and user profile).

pub mod allocator;
pub mod day;
pub mod explain;
pub mod features;
pub mod feedback;
pub mod model;
pub mod placement;
pub mod slots;

use chrono::NaiveDateTime;

/// Slot granularity. Fixed; sub-30-minute placement is out of scope.
pub const SLOT_MINUTES: i64 = 30;

/// A task as the engine sees it. Built from storage rows by the caller.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: i64,
    pub title: String,
    pub duration_minutes: i64,
    pub deadline: NaiveDateTime,
    pub category: String,
    pub importance: String,
    pub preferred_time: String,
    pub energy: String,
}

pub use allocator::{HorizonAllocation, allocate_tasks_to_days};
pub use day::{DaySchedule, DayScheduleRequest, PlacedItem, RejectedTask, schedule_day};
pub use feedback::{FeedbackSignal, LearnedBias, TaskTraits, bias_from_feedback};
pub use model::{ModelError, PriorityModel, load_model, reload_model};
