//! Pre-flight checks run before any stage

use crate::core::{Invocation, Requirement};
use crate::execution::{EventEmitter, ExecutionEvent, PipelineError};
use crate::index::{IndexError, IndexService};
use crate::process::{CommandRunner, ProcessError};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a requirement is not met
#[derive(Debug, Error)]
pub enum PrerequisiteFailure {
    #[error("`{command}` exited with code {exit_code}: {diagnostics}")]
    ProbeExited {
        command: String,
        exit_code: i32,
        diagnostics: String,
    },

    #[error(transparent)]
    Spawn(#[from] ProcessError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("`{0}` not found on PATH")]
    NotOnPath(String),
}

/// Verifies that external tools and services are available
///
/// Each requirement is probed once. A missing tool is a configuration
/// problem, so nothing is retried.
pub struct PrerequisiteChecker<'a> {
    runner: &'a dyn CommandRunner,
    index: &'a dyn IndexService,
    search_path: Option<OsString>,
}

impl<'a> PrerequisiteChecker<'a> {
    pub fn new(runner: &'a dyn CommandRunner, index: &'a dyn IndexService) -> Self {
        Self {
            runner,
            index,
            search_path: None,
        }
    }

    /// Search these directories instead of `$PATH` for binaries
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    /// Whether a single requirement is met
    pub async fn check(&self, requirement: &Requirement) -> bool {
        self.probe(requirement).await.is_ok()
    }

    /// Probe a requirement, returning what was found or why it is not met
    pub async fn probe(&self, requirement: &Requirement) -> Result<Option<String>, PrerequisiteFailure> {
        match requirement {
            Requirement::ContainerRuntime { program } => {
                let probe = Invocation::new(program).arg("ps");
                let result = self.runner.run(&probe, None).await?;
                if result.success() {
                    Ok(None)
                } else {
                    Err(PrerequisiteFailure::ProbeExited {
                        command: probe.to_string(),
                        exit_code: result.exit_code,
                        diagnostics: result.diagnostics().to_string(),
                    })
                }
            }
            Requirement::IndexService => {
                self.index.ping().await?;
                Ok(None)
            }
            Requirement::Binary { name } => {
                let path = self
                    .search_path
                    .clone()
                    .or_else(|| std::env::var_os("PATH"))
                    .unwrap_or_default();
                find_on_path(name, &path)
                    .map(|found| Some(found.display().to_string()))
                    .ok_or_else(|| PrerequisiteFailure::NotOnPath(name.clone()))
            }
        }
    }

    /// Check requirements in order, stopping at the first one not met
    pub async fn check_all(
        &self,
        requirements: &[Requirement],
        events: &EventEmitter,
    ) -> Result<(), PipelineError> {
        for requirement in requirements {
            debug!("Checking prerequisite: {}", requirement);
            match self.probe(requirement).await {
                Ok(detail) => {
                    info!("Prerequisite met: {}", requirement);
                    events.emit(ExecutionEvent::PrerequisiteChecked {
                        requirement: requirement.clone(),
                        passed: true,
                        detail,
                    });
                }
                Err(failure) => {
                    let reason = failure.to_string();
                    warn!("Prerequisite not met: {}: {}", requirement, reason);
                    events.emit(ExecutionEvent::PrerequisiteChecked {
                        requirement: requirement.clone(),
                        passed: false,
                        detail: Some(reason.clone()),
                    });
                    return Err(PipelineError::Prerequisite {
                        requirement: requirement.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Locate an executable by name in a PATH-style list of directories
///
/// Names containing a path separator are checked as-is.
pub fn find_on_path(name: &str, path: &OsStr) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    std::env::split_paths(path)
        .flat_map(|dir| candidates(&dir, name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name), dir.join(format!("{}.exe", name))]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
