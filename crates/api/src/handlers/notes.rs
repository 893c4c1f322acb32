//! Note handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use validator::Validate;

use dayplan_domain::{DomainError, NoteCreate, NoteOut};

use crate::AppState;
use crate::middleware::auth::AuthUser;

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<NoteCreate>,
) -> Result<Json<NoteOut>, DomainError> {
    req.validate().map_err(DomainError::from_validation_errors)?;

    let note = state
        .note_repo
        .create(user_id, &req.title, req.body.as_deref())
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    Ok(Json(NoteOut {
        id: note.id,
        title: note.title,
        body: note.body,
        created_at: note.created_at,
    }))
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<NoteOut>>, DomainError> {
    let notes = state
        .note_repo
        .list_for_user(user_id)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    Ok(Json(
        notes
            .into_iter()
            .map(|note| NoteOut {
                id: note.id,
                title: note.title,
                body: note.body,
                created_at: note.created_at,
            })
            .collect(),
    ))
}
