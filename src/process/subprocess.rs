//! Subprocess runner built on `tokio::process`

use crate::core::{Invocation, OutputMode};
use crate::process::{CommandResult, CommandRunner, OutputCallback, OutputStream, ProcessError};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Runs invocations as real child processes
///
/// Children are spawned with `kill_on_drop`, so dropping an in-flight `run`
/// future (for example on interruption) terminates the child.
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }

    async fn run_captured(&self, invocation: &Invocation) -> Result<CommandResult, ProcessError> {
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProcessError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(CommandResult {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Stream stdout and stderr line by line
    ///
    /// The two pipes are read independently. Lines keep their order within
    /// each stream, but a stdout line and a stderr line written close
    /// together may be delivered in either order.
    async fn run_streamed(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandResult, ProcessError> {
        let io_err = |source: std::io::Error| ProcessError::Io {
            program: invocation.program.clone(),
            source,
        };

        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            io_err(std::io::Error::other("failed to capture stdout"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            io_err(std::io::Error::other("failed to capture stderr"))
        })?;

        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();
        let (mut out_open, mut err_open) = (true, true);
        let mut result = CommandResult::default();

        // Both pipes are drained on this task so a chatty stderr cannot block stdout.
        while out_open || err_open {
            tokio::select! {
                line = out_lines.next_line(), if out_open => match line.map_err(io_err)? {
                    Some(line) => {
                        if let Some(cb) = callback {
                            cb.on_line(OutputStream::Stdout, &line);
                        }
                        push_line(&mut result.stdout, &line);
                    }
                    None => out_open = false,
                },
                line = err_lines.next_line(), if err_open => match line.map_err(io_err)? {
                    Some(line) => {
                        if let Some(cb) = callback {
                            cb.on_line(OutputStream::Stderr, &line);
                        }
                        push_line(&mut result.stderr, &line);
                    }
                    None => err_open = false,
                },
            }
        }

        let status = child.wait().await.map_err(io_err)?;
        result.exit_code = exit_code(status);
        Ok(result)
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandResult, ProcessError> {
        debug!("Spawning `{}` ({:?} mode)", invocation, invocation.output);

        let result = match invocation.output {
            OutputMode::Capture => self.run_captured(invocation).await?,
            OutputMode::Stream => self.run_streamed(invocation, callback).await?,
        };

        if result.success() {
            debug!("`{}` exited successfully", invocation.program);
        } else {
            warn!(
                "`{}` exited with code {}",
                invocation.program, result.exit_code
            );
        }

        Ok(result)
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn push_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
}
