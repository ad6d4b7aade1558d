//! Stage sequencer - runs stages in order and stops at the first failure

use crate::core::{OutputMode, PipelinePhase, PipelineState, Stage};
use crate::execution::{CleanupHandler, EventEmitter, ExecutionEvent, PipelineError};
use crate::process::{CommandRunner, OutputCallback};
use tracing::{error, info};

/// Runs stages strictly in declaration order
///
/// Each stage is invoked at most once. Work done by earlier stages is not
/// rolled back when a later one fails.
pub struct StageSequencer<'a> {
    runner: &'a dyn CommandRunner,
    events: &'a EventEmitter,
    output: Option<&'a dyn OutputCallback>,
}

impl<'a> StageSequencer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, events: &'a EventEmitter) -> Self {
        Self {
            runner,
            events,
            output: None,
        }
    }

    /// Receive streamed stage output
    pub fn with_output(mut self, output: Option<&'a dyn OutputCallback>) -> Self {
        self.output = output;
        self
    }

    /// Run every stage, returning how many completed
    ///
    /// Services started by a stage are registered with `cleanup` before the
    /// stage's command is launched, so a failed or interrupted start is still
    /// torn down.
    pub async fn run(
        &self,
        stages: &[Stage],
        state: &mut PipelineState,
        cleanup: &CleanupHandler,
    ) -> Result<usize, PipelineError> {
        let total = stages.len();

        for (index, stage) in stages.iter().enumerate() {
            let ordinal = index + 1;
            state.advance(PipelinePhase::Stage(ordinal))?;

            info!("[{}/{}] {}: {}", ordinal, total, stage.name, stage.description);
            self.events.emit(ExecutionEvent::StageStarted {
                ordinal,
                total,
                name: stage.name.clone(),
                description: stage.description.clone(),
                command: stage.invocation.to_string(),
            });

            if let Some(service) = &stage.starts_service {
                cleanup.register(service);
            }

            let (exit_code, diagnostics) = match self.runner.run(&stage.invocation, self.output).await {
                Ok(result) if result.success() => {
                    state.completed_stages += 1;
                    info!("Stage {} completed", stage.name);
                    // Streamed output was already delivered line by line.
                    let output = match stage.invocation.output {
                        OutputMode::Capture => result.stdout,
                        OutputMode::Stream => String::new(),
                    };
                    self.events.emit(ExecutionEvent::StageCompleted {
                        ordinal,
                        name: stage.name.clone(),
                        description: stage.description.clone(),
                        output,
                    });

                    if let Some(duration) = stage.settle {
                        self.events.emit(ExecutionEvent::StageSettling {
                            name: stage.name.clone(),
                            duration,
                        });
                        tokio::time::sleep(duration).await;
                    }
                    continue;
                }
                Ok(result) => (Some(result.exit_code), result.diagnostics().to_string()),
                Err(e) => (None, e.to_string()),
            };

            error!("Stage {} failed: {}", stage.name, diagnostics);
            self.events.emit(ExecutionEvent::StageFailed {
                ordinal,
                name: stage.name.clone(),
                description: stage.description.clone(),
                exit_code,
                diagnostics: diagnostics.clone(),
            });

            return Err(PipelineError::Stage {
                ordinal,
                name: stage.name.clone(),
                exit_code,
                diagnostics,
            });
        }

        Ok(state.completed_stages)
    }
}
