//! Task CRUD handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use dayplan_domain::{DetailResponse, DomainError, TaskCreate, TaskOut};
use dayplan_storage::{NewTask, TaskRow};

use crate::AppState;
use crate::middleware::auth::AuthUser;

pub(crate) fn task_out(task: TaskRow) -> TaskOut {
    TaskOut {
        id: task.id,
        user_id: task.user_id,
        title: task.title,
        description: task.description,
        duration_minutes: task.duration_minutes,
        deadline: task.deadline,
        category: task.category,
        importance: task.importance,
        preferred_time: task.preferred_time,
        energy: task.energy,
        status: task.status,
        created_at: task.created_at,
        updated_at: task.updated_at,
    }
}

/// Create a task. Tag strings are lowercased on the way in.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<TaskCreate>,
) -> Result<Json<TaskOut>, DomainError> {
    req.validate().map_err(DomainError::from_validation_errors)?;

    let task = state
        .task_repo
        .create(NewTask {
            user_id,
            title: &req.title,
            description: req.description.as_deref(),
            duration_minutes: req.duration_minutes,
            deadline: req.deadline,
            category: &req.category.to_lowercase(),
            importance: &req.importance.to_lowercase(),
            preferred_time: &req.preferred_time.to_lowercase(),
            energy: &req.energy.to_lowercase(),
        })
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    tracing::info!(user_id, task_id = task.id, "Task created");

    Ok(Json(task_out(task)))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TaskOut>>, DomainError> {
    let tasks = state
        .task_repo
        .list_for_user(user_id)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    Ok(Json(tasks.into_iter().map(task_out).collect()))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<i64>,
) -> Result<Json<TaskOut>, DomainError> {
    let task = state
        .task_repo
        .get_for_user(task_id, user_id)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?
        .ok_or_else(|| DomainError::NotFound("Task not found".to_string()))?;

    Ok(Json(task_out(task)))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<i64>,
) -> Result<Json<DetailResponse>, DomainError> {
    let removed = state
        .task_repo
        .delete_for_user(task_id, user_id)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    if !removed {
        return Err(DomainError::NotFound("Task not found".to_string()));
    }

    Ok(Json(DetailResponse {
        detail: "Task deleted".to_string(),
    }))
}
