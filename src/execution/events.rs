//! Execution events and their fan-out to handlers

use crate::core::{ExecutionStatus, PipelinePhase, Requirement};
use crate::index::IndexSummary;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        title: String,
        working_dir: Option<PathBuf>,
        started_at: DateTime<Utc>,
    },
    PrerequisiteChecked {
        requirement: Requirement,
        passed: bool,
        detail: Option<String>,
    },
    StageStarted {
        ordinal: usize,
        total: usize,
        name: String,
        description: String,
        command: String,
    },
    StageCompleted {
        ordinal: usize,
        name: String,
        description: String,
        /// Captured stdout (empty for streamed stages)
        output: String,
    },
    StageFailed {
        ordinal: usize,
        name: String,
        description: String,
        exit_code: Option<i32>,
        diagnostics: String,
    },
    StageSettling {
        name: String,
        duration: Duration,
    },
    Interrupted {
        phase: PipelinePhase,
    },
    SummaryReported {
        summary: IndexSummary,
    },
    ReportingFailed {
        error: String,
    },
    CleanupStarted {
        services: Vec<String>,
    },
    CleanupFinished {
        error: Option<String>,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
        elapsed: Duration,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Delivers events to every registered handler in registration order
#[derive(Clone, Default)]
pub struct EventEmitter {
    handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn add_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push(Arc::new(handler));
        }
    }

    /// Emit an event to all handlers
    pub fn emit(&self, event: ExecutionEvent) {
        // Handlers are cloned out so one may register another without deadlocking.
        let handlers: Vec<EventHandler> = match self.handlers.lock() {
            Ok(handlers) => handlers.clone(),
            Err(_) => return,
        };
        for handler in handlers {
            handler(event.clone());
        }
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.handlers.lock().map(|h| h.len()).unwrap_or(0);
        f.debug_struct("EventEmitter").field("handlers", &count).finish()
    }
}
