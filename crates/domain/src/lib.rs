//! Domain types for the Dayplan backend.

pub mod auth;
pub mod errors;
pub mod feedback;
pub mod note;
pub mod plan;
pub mod task;
pub mod time;

pub use auth::*;
pub use errors::*;
pub use feedback::*;
pub use note::*;
pub use plan::*;
pub use task::*;

use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Generic detail response for delete-style endpoints.
#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub detail: String,
}
