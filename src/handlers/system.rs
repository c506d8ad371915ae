// handlers/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::bootstrap::Readiness;
use crate::database;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Hub API",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
            }
        }
    }))
}

/// Liveness plus the state boot settled on. 503 only when the database
/// cannot be reached right now.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let status = match state.readiness {
        Readiness::Ready => "ok",
        Readiness::DegradedButServing | Readiness::Failed => "degraded",
    };

    let Some(pool) = state.pool.as_ref() else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": status,
                    "timestamp": now,
                    "schema": state.readiness.as_str(),
                    "database": "not configured"
                }
            })),
        );
    };

    match database::health_check(pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": status,
                    "timestamp": now,
                    "schema": state.readiness.as_str(),
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "schema": state.readiness.as_str()
                    }
                })),
            )
        }
    }
}
