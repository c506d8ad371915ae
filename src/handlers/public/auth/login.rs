// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Principal,
}

/// POST /auth/login - Authenticate user and receive a session token
///
/// Expected Input:
/// ```json
/// { "identifier": "alice", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "token_type": "Bearer",
///     "expires_in": 3600,
///     "expires_at": "2025-01-01T01:00:00Z",
///     "user": { "subject": "user_uuid" }
///   }
/// }
/// ```
///
/// Unknown identifiers and wrong passwords both answer 401 "Invalid credentials".
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let identifier = payload.identifier.trim();
    if identifier.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("identifier and password are required"));
    }

    let principal = state
        .credentials
        .verify_credentials(identifier, &payload.password)
        .await?;

    let issued = state.tokens.issue(&principal, Utc::now())?;
    tracing::info!("Issued session token for subject '{}'", principal.subject);

    Ok(ApiResponse::success(LoginResponse {
        expires_in: issued.expires_in(),
        expires_at: issued.expires_at(),
        token: issued.token,
        token_type: "Bearer",
        user: principal,
    }))
}
