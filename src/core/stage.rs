//! Stage domain model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// How a child process's output is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Forward lines to the terminal as they arrive
    Stream,
    /// Collect output and show it once the process exits
    #[default]
    Capture,
}

/// A structured command descriptor
///
/// Arguments are passed to the program directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Executable name or path
    pub program: String,

    /// Arguments in order
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory (inherits the orchestrator's when unset)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Environment overrides applied on top of the inherited environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Output handling
    #[serde(default)]
    pub output: OutputMode,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            output: OutputMode::Capture,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn current_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn streaming(mut self) -> Self {
        self.output = OutputMode::Stream;
        self
    }

    /// Build the tokio command for this invocation
    pub fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command.envs(&self.env);
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// One ordered unit of pipeline work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Short stage name
    pub name: String,

    /// The external command this stage runs
    pub invocation: Invocation,

    /// Human-readable description printed when the stage starts
    pub description: String,

    /// Supporting service this stage brings up, torn down at cleanup
    pub starts_service: Option<String>,

    /// Wait after the stage succeeds, before the next one starts
    pub settle: Option<Duration>,
}

impl Stage {
    pub fn new(
        name: impl Into<String>,
        invocation: Invocation,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            invocation,
            description: description.into(),
            starts_service: None,
            settle: None,
        }
    }

    /// Mark this stage as starting a supporting service
    pub fn starts_service(mut self, service: impl Into<String>) -> Self {
        self.starts_service = Some(service.into());
        self
    }

    pub fn settle_for(mut self, duration: Duration) -> Self {
        self.settle = Some(duration).filter(|d| !d.is_zero());
        self
    }
}
