//! Running external commands

pub mod streaming;
pub mod subprocess;

use crate::core::Invocation;
use async_trait::async_trait;
use thiserror::Error;

pub use streaming::{NoopCallback, OutputCallback, OutputStream};
pub use subprocess::SubprocessRunner;

/// Error types for process execution
///
/// A non-zero exit is not an error; it is reported through [`CommandResult`].
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one finished process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResult {
    /// Exit code, `-1` when the process was killed by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Text worth showing when the command failed: stderr, else stdout
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Trait for command execution - allows for fake runners in tests
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run an invocation to completion
    ///
    /// Stream-mode output is delivered to `callback` as it arrives.
    async fn run(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandResult, ProcessError>;

    /// Run and reduce the outcome to a success flag
    async fn run_stage(&self, invocation: &Invocation, description: &str) -> bool {
        match self.run(invocation, None).await {
            Ok(result) => {
                if !result.success() {
                    tracing::warn!(
                        "{} failed with exit code {}: {}",
                        description,
                        result.exit_code,
                        result.diagnostics()
                    );
                }
                result.success()
            }
            Err(e) => {
                tracing::warn!("{} could not run: {}", description, e);
                false
            }
        }
    }
}
