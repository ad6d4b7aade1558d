//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Overall pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// Every stage completed
    Completed,
    /// A prerequisite or a stage failed
    Failed,
    /// An external signal stopped the run
    Interrupted,
}

impl ExecutionStatus {
    /// Process exit code for a finished run
    pub fn exit_code(self) -> i32 {
        match self {
            ExecutionStatus::Completed => 0,
            _ => 1,
        }
    }
}

/// Position in the pipeline lifecycle
///
/// Phases only move forward. Any phase may jump to `CleanedUp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Init,
    PrereqsOk,
    /// Running the stage with this 1-based ordinal
    Stage(usize),
    Reported,
    CleanedUp,
}

impl PipelinePhase {
    fn rank(self) -> (u8, usize) {
        match self {
            PipelinePhase::Init => (0, 0),
            PipelinePhase::PrereqsOk => (1, 0),
            PipelinePhase::Stage(n) => (2, n),
            PipelinePhase::Reported => (3, 0),
            PipelinePhase::CleanedUp => (4, 0),
        }
    }

    /// Whether moving from `self` to `next` is allowed
    pub fn can_transition_to(self, next: PipelinePhase) -> bool {
        match (self, next) {
            (PipelinePhase::CleanedUp, _) => false,
            (_, PipelinePhase::CleanedUp) => true,
            (PipelinePhase::Init, PipelinePhase::PrereqsOk) => true,
            (PipelinePhase::PrereqsOk, PipelinePhase::Stage(1)) => true,
            (PipelinePhase::Stage(n), PipelinePhase::Stage(m)) => m == n + 1,
            (PipelinePhase::PrereqsOk | PipelinePhase::Stage(_), PipelinePhase::Reported) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelinePhase::Init => write!(f, "INIT"),
            PipelinePhase::PrereqsOk => write!(f, "PREREQS_OK"),
            PipelinePhase::Stage(n) => write!(f, "STAGE[{}]", n),
            PipelinePhase::Reported => write!(f, "REPORTED"),
            PipelinePhase::CleanedUp => write!(f, "CLEANED_UP"),
        }
    }
}

impl PartialOrd for PipelinePhase {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.rank().cmp(&other.rank()))
    }
}

/// State of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Unique run ID
    pub execution_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// Current lifecycle phase
    pub phase: PipelinePhase,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of stages
    pub total_stages: usize,

    /// Number of stages that exited successfully
    pub completed_stages: usize,
}

impl PipelineState {
    /// Create a new pipeline state
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            phase: PipelinePhase::Init,
            started_at: None,
            completed_at: None,
            total_stages: 0,
            completed_stages: 0,
        }
    }

    /// Mark pipeline as started
    pub fn start(&mut self, total_stages: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_stages = total_stages;
    }

    /// Move to the next phase, rejecting backward or skipping moves
    pub fn advance(&mut self, next: PipelinePhase) -> Result<(), (PipelinePhase, PipelinePhase)> {
        if !self.phase.can_transition_to(next) {
            return Err((self.phase, next));
        }
        self.phase = next;
        Ok(())
    }

    /// Record the final status unless one was already set
    pub fn finish(&mut self, status: ExecutionStatus) {
        if matches!(self.status, ExecutionStatus::Pending | ExecutionStatus::Running) {
            self.status = status;
        }
        self.completed_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run so far
    pub fn elapsed(&self) -> std::time::Duration {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        self.started_at
            .and_then(|start| end.signed_duration_since(start).to_std().ok())
            .unwrap_or_default()
    }

    /// Calculate progress percentage (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_stages == 0 {
            return 0.0;
        }
        self.completed_stages as f64 / self.total_stages as f64
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
