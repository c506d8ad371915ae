// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::Extension;

use crate::auth::Principal;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/whoami - Principal attached by the auth gate
pub async fn whoami(Extension(principal): Extension<Principal>) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal))
}
