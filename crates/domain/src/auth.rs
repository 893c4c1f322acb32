//! Auth types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::task::UserProfile;

/// Signup request.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: String,
    pub profile: UserProfile,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// User profile response.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub profile: UserProfile,
    pub timezone: String,
    pub created_at: Option<NaiveDateTime>,
    pub last_login_at: Option<NaiveDateTime>,
}

/// Auth response with access token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserOut,
}

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: u64,    // expiration timestamp
    pub iat: u64,    // issued at
}
