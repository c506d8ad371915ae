use async_trait::async_trait;
use std::sync::Mutex;

use crate::bootstrap::{ChangeId, SchemaError, SchemaProvider};

/// In-memory schema provider that records every call it receives.
pub struct FakeSchema {
    state: Mutex<FakeState>,
}

struct FakeState {
    connected: bool,
    create_error: Option<String>,
    fail_at: Option<ChangeId>,
    pending: Vec<ChangeId>,
    applied: Vec<ChangeId>,
    calls: Vec<&'static str>,
}

impl FakeSchema {
    fn with_state(connected: bool, pending: Vec<ChangeId>, create_error: Option<String>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                connected,
                create_error,
                fail_at: None,
                pending,
                applied: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    pub fn reachable(pending: Vec<ChangeId>) -> Self {
        Self::with_state(true, pending, None)
    }

    /// Not reachable until `create_if_absent` runs.
    pub fn absent(pending: Vec<ChangeId>) -> Self {
        Self::with_state(false, pending, None)
    }

    /// Not reachable, and creation fails too.
    pub fn unreachable() -> Self {
        Self::with_state(false, Vec::new(), Some("connection refused".to_string()))
    }

    pub fn with_create_error(self, message: &str) -> Self {
        self.state.lock().unwrap().create_error = Some(message.to_string());
        self
    }

    pub fn failing_at(self, change: ChangeId) -> Self {
        self.state.lock().unwrap().fail_at = Some(change);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn applied(&self) -> Vec<ChangeId> {
        self.state.lock().unwrap().applied.clone()
    }
}

#[async_trait]
impl SchemaProvider for FakeSchema {
    async fn can_connect(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push("can_connect");
        state.connected
    }

    async fn pending_changes(&self) -> Result<Vec<ChangeId>, SchemaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("pending_changes");
        if !state.connected {
            return Err(SchemaError::Connectivity("connection refused".to_string()));
        }
        Ok(state.pending.clone())
    }

    async fn apply_pending(&self) -> Result<(), SchemaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("apply_pending");
        if !state.connected {
            return Err(SchemaError::Connectivity("connection refused".to_string()));
        }

        let mut remaining = std::mem::take(&mut state.pending).into_iter();
        while let Some(change) = remaining.next() {
            if state.fail_at.as_ref() == Some(&change) {
                let message = format!("{} failed", change);
                state.pending = std::iter::once(change).chain(remaining).collect();
                return Err(SchemaError::Apply(message));
            }
            state.applied.push(change);
        }
        Ok(())
    }

    async fn create_if_absent(&self) -> Result<(), SchemaError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("create_if_absent");
        if let Some(message) = &state.create_error {
            return Err(SchemaError::Provision(message.clone()));
        }
        state.connected = true;
        Ok(())
    }
}
