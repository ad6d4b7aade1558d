//! Main execution engine - orchestrates the entire pipeline run

use crate::{
    core::{ExecutionStatus, Pipeline, PipelinePhase, PipelineState},
    execution::{
        CleanupHandler, EventEmitter, ExecutionEvent, PipelineError, PrerequisiteChecker,
        ResultReporter, StageSequencer,
    },
    index::{IndexService, IndexSummary},
    process::{CommandRunner, OutputCallback},
};
use std::ffi::OsString;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default number of documents fetched for the post-run sample
pub const DEFAULT_SAMPLE_SIZE: usize = 3;

/// Result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub state: PipelineState,
    /// Present when reporting ran and succeeded
    pub summary: Option<IndexSummary>,
    /// The fatal error that ended the run, if any
    pub error: Option<PipelineError>,
}

impl PipelineOutcome {
    pub fn status(&self) -> ExecutionStatus {
        self.state.status
    }

    /// 0 on full success, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        self.state.status.exit_code()
    }
}

/// Main pipeline execution engine
pub struct ExecutionEngine<R, I> {
    runner: R,
    index: I,
    events: EventEmitter,
    output: Option<Arc<dyn OutputCallback>>,
    search_path: Option<OsString>,
    report: bool,
    sample_size: usize,
}

impl<R: CommandRunner, I: IndexService> ExecutionEngine<R, I> {
    pub fn new(runner: R, index: I) -> Self {
        Self {
            runner,
            index,
            events: EventEmitter::new(),
            output: None,
            search_path: None,
            report: true,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Receive output lines from streamed stages
    pub fn with_output_callback(mut self, callback: Arc<dyn OutputCallback>) -> Self {
        self.output = Some(callback);
        self
    }

    /// Look up prerequisite binaries here instead of `$PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Skip the post-run index summary
    pub fn without_report(mut self) -> Self {
        self.report = false;
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.add_handler(handler);
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Execute the entire pipeline
    ///
    /// `shutdown` resolving stops whatever is in flight and marks the run
    /// interrupted. Cleanup runs exactly once on every path, including
    /// interruption, and is not itself interruptible.
    pub async fn execute<F>(&self, pipeline: &Pipeline, shutdown: F) -> PipelineOutcome
    where
        F: Future<Output = ()>,
    {
        let mut state = PipelineState::new();
        state.start(pipeline.stages.len());
        let execution_id = state.execution_id;

        info!("Starting pipeline execution: {} ({})", pipeline.name, execution_id);
        self.events.emit(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            title: pipeline.title.clone(),
            working_dir: pipeline
                .stages
                .first()
                .and_then(|s| s.invocation.working_dir.clone()),
            started_at: state.started_at.unwrap_or_else(chrono::Utc::now),
        });

        let cleanup = CleanupHandler::new(pipeline.teardown.clone());
        tokio::pin!(shutdown);

        // Dropping the in-flight future kills any running child process.
        let mut failure = tokio::select! {
            biased;
            _ = &mut shutdown => Some(PipelineError::Interrupted),
            result = self.run_stages(pipeline, &mut state, &cleanup) => result.err(),
        };

        let mut summary = None;
        if failure.is_none() && self.report {
            let reporter = ResultReporter::new(&self.index, self.sample_size);
            tokio::select! {
                biased;
                _ = &mut shutdown => failure = Some(PipelineError::Interrupted),
                result = reporter.summarize() => match result {
                    Ok(s) => {
                        info!("Index {} holds {} documents", self.index.index_name(), s.document_count);
                        self.events.emit(ExecutionEvent::SummaryReported { summary: s.clone() });
                        summary = Some(s);
                    }
                    Err(e) => {
                        warn!("Could not summarize index: {}", e);
                        self.events.emit(ExecutionEvent::ReportingFailed { error: e.to_string() });
                    }
                },
            }

            if failure.is_none() {
                if let Err(transition) = state.advance(PipelinePhase::Reported) {
                    failure = Some(transition.into());
                }
            }
        }

        match &failure {
            Some(PipelineError::Interrupted) => {
                warn!("Pipeline interrupted during {}", state.phase);
                self.events.emit(ExecutionEvent::Interrupted { phase: state.phase });
            }
            Some(e) => error!("Pipeline failed: {}", e),
            None => {}
        }

        cleanup.cleanup(&self.runner, &self.events).await;
        if let Err(transition) = state.advance(PipelinePhase::CleanedUp) {
            failure.get_or_insert(transition.into());
        }

        let status = match &failure {
            None => ExecutionStatus::Completed,
            Some(PipelineError::Interrupted) => ExecutionStatus::Interrupted,
            Some(_) => ExecutionStatus::Failed,
        };
        state.finish(status);

        info!("Pipeline {} finished: {:?}", pipeline.name, status);
        self.events.emit(ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
            elapsed: state.elapsed(),
        });

        PipelineOutcome {
            state,
            summary,
            error: failure,
        }
    }

    /// Prerequisites, then every stage in order
    async fn run_stages(
        &self,
        pipeline: &Pipeline,
        state: &mut PipelineState,
        cleanup: &CleanupHandler,
    ) -> Result<usize, PipelineError> {
        PrerequisiteChecker::new(&self.runner, &self.index)
            .with_search_path(self.search_path.clone())
            .check_all(&pipeline.prerequisites, &self.events)
            .await?;
        state.advance(PipelinePhase::PrereqsOk)?;

        StageSequencer::new(&self.runner, &self.events)
            .with_output(self.output.as_deref())
            .run(&pipeline.stages, state, cleanup)
            .await
    }
}
