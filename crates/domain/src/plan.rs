//! Planning request/response schemas.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::task::UnscheduledTaskOut;

/// `POST /planning/plan` request body.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub date: NaiveDate,
}

/// `GET /planning/plan` query.
#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub plan_date: NaiveDate,
}

/// `GET /planning/calendar` query.
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// `PATCH /planning/item/{id}` query. Instants are parsed and normalized by
/// the handler so an unparseable value maps to 400 rather than 422.
#[derive(Debug, Deserialize)]
pub struct ItemUpdateQuery {
    pub start: String,
    pub end: String,
}

/// One scheduled plan item in a response.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledTaskOut {
    pub plan_item_id: i64,
    pub task_id: i64,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub explanation: String,
    pub priority: f64,
    pub llm_explanation: Option<String>,
}

/// `POST /planning/plan` and `GET /planning/plan` response.
#[derive(Debug, Serialize)]
pub struct PlanOut {
    pub model_version: String,
    pub model_confidence: Option<f64>,
    pub scheduled: Vec<ScheduledTaskOut>,
    pub unscheduled: Vec<UnscheduledTaskOut>,
}

/// One day in the calendar response.
#[derive(Debug, Serialize)]
pub struct CalendarDayOut {
    pub plan_date: NaiveDate,
    pub model_version: String,
    pub summary: Option<String>,
    pub scheduled: Vec<ScheduledTaskOut>,
}

/// `GET /planning/calendar` response.
#[derive(Debug, Serialize)]
pub struct CalendarOut {
    pub days: Vec<CalendarDayOut>,
}
