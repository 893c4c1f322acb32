//! Configuration module for the Dayplan backend.

use serde::Deserialize;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// JWT secret for token signing
    pub jwt_secret: String,
    /// Path to the trained priority-model artifact (JSON)
    pub model_path: String,
    /// Address to bind the server to
    pub bind_address: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env_var_or("DATABASE_URL", "sqlite://dayplan.db"),
            jwt_secret: env_var("JWT_SECRET")?,
            model_path: env_var_or("MODEL_PATH", "./priority_model.json"),
            bind_address: env_var_or("BIND_ADDRESS", "0.0.0.0:8080"),
        })
    }
}

fn env_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn env_var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
