//! corpus-pipeline - orchestrates crawl, extraction and indexing runs

pub mod cli;
pub mod core;
pub mod execution;
pub mod index;
pub mod process;

// Re-export commonly used types
pub use core::{ExecutionStatus, Invocation, OrchestratorConfig, Pipeline, PipelinePhase, Requirement, Stage};
pub use execution::{CleanupHandler, ExecutionEngine, ExecutionEvent, PipelineError, PipelineOutcome};
pub use index::{ElasticClient, IndexError, IndexService, IndexSummary};
pub use process::{CommandResult, CommandRunner, OutputCallback, ProcessError, SubprocessRunner};
