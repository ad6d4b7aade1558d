//! Pipeline error taxonomy
//!
//! Only fatal kinds live here. Reporting and cleanup failures are logged and
//! surfaced as events; they never abort a run or change its exit code.

use crate::core::{PipelinePhase, Requirement};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// A required tool or service is missing; no stage has run
    #[error("prerequisite not met: {requirement}: {reason}")]
    Prerequisite {
        requirement: Requirement,
        reason: String,
    },

    /// A stage exited non-zero or could not be started
    #[error("stage {ordinal} `{name}` failed ({}){}", exit_label(.exit_code), detail_suffix(.diagnostics))]
    Stage {
        ordinal: usize,
        name: String,
        exit_code: Option<i32>,
        diagnostics: String,
    },

    /// An external signal stopped the run
    #[error("pipeline interrupted")]
    Interrupted,

    #[error("invalid phase transition {from} -> {to}")]
    InvalidTransition {
        from: PipelinePhase,
        to: PipelinePhase,
    },
}

fn exit_label(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "could not start".to_string(),
    }
}

fn detail_suffix(diagnostics: &str) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!(": {}", diagnostics)
    }
}

impl From<(PipelinePhase, PipelinePhase)> for PipelineError {
    fn from((from, to): (PipelinePhase, PipelinePhase)) -> Self {
        PipelineError::InvalidTransition { from, to }
    }
}
