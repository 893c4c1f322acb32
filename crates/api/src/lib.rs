//! Dayplan backend server library.

pub mod handlers;
pub mod middleware;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use dayplan_config::AppConfig;
use dayplan_domain::HealthResponse;
use dayplan_storage::{
    FeedbackRepository, NoteRepository, PlanRepository, TaskRepository, UserRepository,
};
use sqlx::SqlitePool;

use handlers::auth::{get_me, login, signup};
use handlers::feedback::{create_feedback, list_feedback};
use handlers::notes::{create_note, list_notes};
use handlers::planning::{calendar, delete_plan_item, generate_plan, get_plan, update_plan_item};
use handlers::tasks::{create_task, delete_task, get_task, list_tasks};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub user_repo: UserRepository,
    pub task_repo: TaskRepository,
    pub plan_repo: PlanRepository,
    pub feedback_repo: FeedbackRepository,
    pub note_repo: NoteRepository,
    pub config: AppConfig,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        AppState {
            user_repo: UserRepository::new(pool.clone()),
            task_repo: TaskRepository::new(pool.clone()),
            plan_repo: PlanRepository::new(pool.clone()),
            feedback_repo: FeedbackRepository::new(pool.clone()),
            note_repo: NoteRepository::new(pool.clone()),
            pool,
            config,
            start_time: Instant::now(),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/auth/signup", post(signup))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(get_me))
        .route("/api/v1/tasks", post(create_task).get(list_tasks))
        .route("/api/v1/tasks/{id}", get(get_task).delete(delete_task))
        .route("/api/v1/planning/plan", post(generate_plan).get(get_plan))
        .route("/api/v1/planning/calendar", get(calendar))
        .route(
            "/api/v1/planning/item/{id}",
            patch(update_plan_item).delete(delete_plan_item),
        )
        .route("/api/v1/feedback", post(create_feedback).get(list_feedback))
        .route("/api/v1/notes", post(create_note).get(list_notes))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
    })
}
