#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use serde_json::Value;
use tower::ServiceExt;

use hub_api::app::{self, AppState};
use hub_api::auth::{AuthFailure, CredentialStore, Principal, TokenService};
use hub_api::bootstrap::{ChangeId, Readiness, SchemaError, SchemaProvider};
use hub_api::config::TokenSettings;

pub const SECRET: &str = "s3cr3t";
pub const ISSUER: &str = "hub";
pub const AUDIENCE: &str = "app";

pub fn settings() -> TokenSettings {
    TokenSettings::new(SECRET, ISSUER, AUDIENCE).with_validity_secs(3600)
}

pub fn token_service() -> TokenService {
    TokenService::new(settings()).expect("valid token settings")
}

/// Credentials held in memory: identifier -> (password, subject).
pub struct MemoryCredentials {
    users: HashMap<String, (String, String)>,
}

impl MemoryCredentials {
    pub fn with_user(identifier: &str, password: &str, subject: &str) -> Self {
        let mut users = HashMap::new();
        users.insert(identifier.to_string(), (password.to_string(), subject.to_string()));
        Self { users }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn verify_credentials(&self, identifier: &str, secret: &str) -> Result<Principal, AuthFailure> {
        match self.users.get(identifier) {
            Some((password, subject)) if password == secret => Ok(Principal::new(subject.clone())),
            _ => Err(AuthFailure::InvalidCredentials),
        }
    }
}

pub fn state_with(readiness: Readiness) -> AppState {
    AppState {
        tokens: Arc::new(token_service()),
        credentials: Arc::new(MemoryCredentials::with_user("alice", "wonderland", "u1")),
        readiness,
        pool: None,
    }
}

pub fn test_app() -> Router {
    app::router(state_with(Readiness::Ready), &["http://localhost:3000".to_string()])
}

pub async fn send(app: Router, request: Request<Body>) -> anyhow::Result<(axum::http::StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

/// Schema provider with scripted answers.
pub struct ScriptedSchema {
    pub reachable: bool,
    pub pending: Vec<ChangeId>,
    pub applied: Mutex<Vec<ChangeId>>,
}

impl ScriptedSchema {
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            pending: Vec::new(),
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn reachable(pending: Vec<ChangeId>) -> Self {
        Self {
            reachable: true,
            pending,
            applied: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SchemaProvider for ScriptedSchema {
    async fn can_connect(&self) -> bool {
        self.reachable
    }

    async fn pending_changes(&self) -> Result<Vec<ChangeId>, SchemaError> {
        if !self.reachable {
            return Err(SchemaError::Connectivity("connection refused".to_string()));
        }
        Ok(self.pending.clone())
    }

    async fn apply_pending(&self) -> Result<(), SchemaError> {
        if !self.reachable {
            return Err(SchemaError::Connectivity("connection refused".to_string()));
        }
        let mut applied = self.applied.lock().unwrap();
        applied.extend(self.pending.iter().cloned());
        Ok(())
    }

    async fn create_if_absent(&self) -> Result<(), SchemaError> {
        Err(SchemaError::Provision("connection refused".to_string()))
    }
}
