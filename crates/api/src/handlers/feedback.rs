//! Feedback handlers. The log is append-only; the planner reads it back
//! through the bias learner.

use std::sync::Arc;

use axum::{Json, extract::State};

use dayplan_domain::{DomainError, FeedbackCreate, FeedbackOut};
use dayplan_storage::FeedbackRow;

use crate::AppState;
use crate::middleware::auth::AuthUser;

fn feedback_out(row: FeedbackRow) -> FeedbackOut {
    FeedbackOut {
        id: row.id,
        task_id: row.task_id,
        outcome: row.outcome,
        note: row.note,
        created_at: row.created_at,
    }
}

pub async fn create_feedback(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<FeedbackCreate>,
) -> Result<Json<FeedbackOut>, DomainError> {
    if req.outcome != 1 && req.outcome != -1 {
        return Err(DomainError::Validation(
            "outcome must be +1 or -1".to_string(),
        ));
    }

    let row = state
        .feedback_repo
        .insert(user_id, req.task_id, req.outcome, req.note.as_deref())
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    Ok(Json(feedback_out(row)))
}

pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<FeedbackOut>>, DomainError> {
    let rows = state
        .feedback_repo
        .list_for_user(user_id)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    Ok(Json(rows.into_iter().map(feedback_out).collect()))
}
