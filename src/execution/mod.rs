//! Pipeline execution engine

pub mod cleanup;
pub mod engine;
pub mod error;
pub mod events;
pub mod prerequisites;
pub mod reporter;
pub mod sequencer;

pub use cleanup::CleanupHandler;
pub use engine::{ExecutionEngine, PipelineOutcome, DEFAULT_SAMPLE_SIZE};
pub use error::PipelineError;
pub use events::{EventEmitter, EventHandler, ExecutionEvent};
pub use prerequisites::{find_on_path, PrerequisiteChecker, PrerequisiteFailure};
pub use reporter::ResultReporter;
pub use sequencer::StageSequencer;
