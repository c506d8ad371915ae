//! Boot-time schema readiness.
//!
//! [`ReadinessOrchestrator::run`] is awaited once before the listener is bound.
//! It probes the database, optionally creates it, applies pending schema
//! changes, and settles on a terminal [`Readiness`]. Failures are turned into
//! that terminal state according to the [`FailurePolicy`]: `Strict` aborts
//! boot, `Tolerant` logs and keeps serving.

pub mod schema;

pub use schema::{ChangeId, SchemaError, SchemaProvider};

use serde::Serialize;
use tracing::{error, info, warn};

/// How boot reacts to a schema failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailurePolicy {
    /// Abort startup. Used in development so drift is noticed immediately.
    Strict,
    /// Log and keep serving with whatever schema is there.
    Tolerant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub auto_apply: bool,
    pub create_if_absent: bool,
    pub failure: FailurePolicy,
}

/// Intermediate states, recorded in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Start,
    CheckingConnectivity,
    Connected,
    Unreachable,
    CreatingSchema,
    Aborted,
    ApplyingChanges,
    Applied,
    NoChangesNeeded,
    ApplyFailed,
}

/// Terminal state of a readiness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    Ready,
    DegradedButServing,
    Failed,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::Ready => "ready",
            Readiness::DegradedButServing => "degraded",
            Readiness::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    pub state: Readiness,
    pub phases: Vec<Phase>,
    pub connected: bool,
    pub applied: Vec<ChangeId>,
    pub error: Option<SchemaError>,
}

impl ReadinessReport {
    fn new() -> Self {
        Self {
            state: Readiness::Failed,
            phases: vec![Phase::Start],
            connected: false,
            applied: Vec::new(),
            error: None,
        }
    }

    pub fn may_serve(&self) -> bool {
        !matches!(self.state, Readiness::Failed)
    }

    /// `Err` only for `Failed`; the process must not start serving then.
    pub fn into_result(self) -> Result<Self, SchemaError> {
        match (self.state, &self.error) {
            (Readiness::Failed, Some(e)) => Err(e.clone()),
            (Readiness::Failed, None) => Err(SchemaError::Connectivity("schema readiness failed".to_string())),
            _ => Ok(self),
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phases.push(phase);
    }
}

pub struct ReadinessOrchestrator<'a> {
    provider: &'a dyn SchemaProvider,
    policy: ReadinessPolicy,
}

impl<'a> ReadinessOrchestrator<'a> {
    pub fn new(provider: &'a dyn SchemaProvider, policy: ReadinessPolicy) -> Self {
        Self { provider, policy }
    }

    pub async fn run(&self) -> ReadinessReport {
        let mut report = ReadinessReport::new();

        if !self.policy.auto_apply && !self.policy.create_if_absent {
            info!("Automatic schema provisioning is disabled");
            report.state = Readiness::DegradedButServing;
            return report;
        }

        info!("Checking schema readiness");
        match self.provision(&mut report).await {
            Ok(()) => {
                report.state = Readiness::Ready;
                info!("Schema ready");
            }
            Err(e) => self.settle_failure(&mut report, e),
        }

        report
    }

    async fn provision(&self, report: &mut ReadinessReport) -> Result<(), SchemaError> {
        report.enter(Phase::CheckingConnectivity);

        // Set when creation fails but the run continues; surfaces only if
        // nothing later proves the database usable.
        let mut deferred: Option<SchemaError> = None;

        if self.provider.can_connect().await {
            report.enter(Phase::Connected);
            report.connected = true;
        } else {
            report.enter(Phase::Unreachable);
            if !self.policy.create_if_absent {
                report.enter(Phase::Aborted);
                return Err(SchemaError::Connectivity(
                    "database is unreachable and creation is disabled".to_string(),
                ));
            }

            report.enter(Phase::CreatingSchema);
            warn!("Database unreachable, attempting to create it");
            match self.provider.create_if_absent().await {
                Ok(()) => info!("Database created"),
                Err(e) => {
                    warn!("Database creation failed, continuing: {}", e);
                    deferred = Some(e);
                }
            }
        }

        if !self.policy.auto_apply {
            return match deferred {
                Some(e) => Err(e),
                None => Ok(()),
            };
        }

        report.enter(Phase::ApplyingChanges);
        let pending = match self.provider.pending_changes().await {
            Ok(pending) => pending,
            Err(e) => {
                report.enter(Phase::ApplyFailed);
                return Err(e);
            }
        };

        if pending.is_empty() {
            report.enter(Phase::NoChangesNeeded);
            info!("No pending schema changes");
            return Ok(());
        }

        let names: Vec<String> = pending.iter().map(ToString::to_string).collect();
        info!("Applying {} pending schema changes: {}", pending.len(), names.join(", "));

        if let Err(e) = self.provider.apply_pending().await {
            report.enter(Phase::ApplyFailed);
            return Err(e);
        }

        report.enter(Phase::Applied);
        report.applied = pending;
        info!("Schema changes applied");
        Ok(())
    }

    fn settle_failure(&self, report: &mut ReadinessReport, e: SchemaError) {
        error!("Schema readiness failed: {}", e);
        report.state = match self.policy.failure {
            FailurePolicy::Strict => Readiness::Failed,
            FailurePolicy::Tolerant => {
                warn!("Continuing to serve without schema changes");
                Readiness::DegradedButServing
            }
        };
        report.error = Some(e);
    }
}
