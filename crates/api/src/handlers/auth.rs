//! Auth handlers: signup, login, current user.

use std::sync::Arc;

use axum::{Json, extract::State};
use jsonwebtoken::{EncodingKey, Header, encode};
use validator::Validate;

use dayplan_domain::{
    AuthResponse, Claims, DomainError, LoginRequest, SignupRequest, UserOut,
};
use dayplan_storage::UserRow;

use crate::AppState;
use crate::middleware::auth::AuthUser;

const TOKEN_TTL_SECONDS: u64 = 3600;

fn issue_token(user_id: i64, jwt_secret: &str) -> Result<String, DomainError> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| DomainError::Internal(anyhow::anyhow!("System clock error: {e}")))?
        .as_secs();

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + TOKEN_TTL_SECONDS,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Failed to encode JWT: {}", e);
        DomainError::Internal(anyhow::anyhow!("Failed to generate access token: {e}"))
    })
}

fn user_out(user: UserRow) -> UserOut {
    UserOut {
        id: user.id,
        email: user.email,
        name: user.name,
        profile: user.profile,
        timezone: user.timezone,
        created_at: user.created_at,
        last_login_at: user.last_login_at,
    }
}

fn auth_response(user: UserRow, jwt_secret: &str) -> Result<AuthResponse, DomainError> {
    let token = issue_token(user.id, jwt_secret)?;
    Ok(AuthResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: user_out(user),
    })
}

/// Register a new account with default settings.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, DomainError> {
    req.validate().map_err(DomainError::from_validation_errors)?;

    if state
        .user_repo
        .find_by_email(&req.email)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?
        .is_some()
    {
        return Err(DomainError::Conflict("Email already registered".to_string()));
    }

    let hashed = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| DomainError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))?;

    let user = state
        .user_repo
        .create(&req.email, &req.name, req.profile, &hashed)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    // Settings are created eagerly so the first plan sees defaults.
    state
        .user_repo
        .get_or_create_settings(user.id)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(Json(auth_response(user, &state.config.jwt_secret)?))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, DomainError> {
    req.validate().map_err(DomainError::from_validation_errors)?;

    let user = state
        .user_repo
        .find_by_email(&req.email)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?
        .ok_or_else(|| DomainError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = bcrypt::verify(&req.password, &user.hashed_password).unwrap_or(false);
    if !valid {
        return Err(DomainError::Unauthorized("Invalid credentials".to_string()));
    }
    if !user.is_active {
        return Err(DomainError::Forbidden("Inactive account".to_string()));
    }

    state
        .user_repo
        .touch_last_login(user.id)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(auth_response(user, &state.config.jwt_secret)?))
}

/// Get current user profile.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserOut>, DomainError> {
    let user = state
        .user_repo
        .get_by_id(user_id)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?
        .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;

    Ok(Json(user_out(user)))
}
