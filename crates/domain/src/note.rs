//! Note schemas.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Note creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct NoteCreate {
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: String,
    pub body: Option<String>,
}

/// Note response.
#[derive(Debug, Serialize)]
pub struct NoteOut {
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    pub created_at: NaiveDateTime,
}
