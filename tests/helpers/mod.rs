//! Test utility functions for corpus-pipeline

#![allow(dead_code)]

use async_trait::async_trait;
use corpus_pipeline::core::{Invocation, Pipeline, Requirement, Stage};
use corpus_pipeline::execution::{ExecutionEngine, ExecutionEvent, PipelineOutcome};
use corpus_pipeline::index::{IndexError, IndexService, SampleDocument};
use corpus_pipeline::process::{CommandResult, CommandRunner, OutputCallback, ProcessError};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Teardown used by the test pipelines
pub const TEARDOWN: &str = "compose down";

/// Fake command runner that records invocations
///
/// Every invocation exits 0 unless its rendered command line contains a
/// scripted pattern.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<String>>,
    exit_codes: Vec<(String, i32)>,
    unspawnable: Vec<String>,
    hang_on: Option<String>,
    hung: Arc<Notify>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with `code` when the command line contains `pattern`
    pub fn exit_with(mut self, pattern: &str, code: i32) -> Self {
        self.exit_codes.push((pattern.to_string(), code));
        self
    }

    /// Fail to spawn when the command line contains `pattern`
    pub fn unspawnable(mut self, pattern: &str) -> Self {
        self.unspawnable.push(pattern.to_string());
        self
    }

    /// Never finish when the command line contains `pattern`
    pub fn hang_on(mut self, pattern: &str) -> Self {
        self.hang_on = Some(pattern.to_string());
        self
    }

    /// Notified once a hanging invocation has started
    pub fn hung(&self) -> Arc<Notify> {
        self.hung.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandResult, ProcessError> {
        let line = invocation.to_string();
        self.calls.lock().unwrap().push(line.clone());

        if self.unspawnable.iter().any(|p| line.contains(p.as_str())) {
            return Err(ProcessError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        if self.hang_on.as_deref().is_some_and(|p| line.contains(p)) {
            self.hung.notify_one();
            std::future::pending::<()>().await;
        }

        let exit_code = self
            .exit_codes
            .iter()
            .find(|(p, _)| line.contains(p.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);

        let stdout = format!("ran {}\n", line);
        if let Some(cb) = callback {
            cb.on_line(corpus_pipeline::process::OutputStream::Stdout, stdout.trim_end());
        }

        Ok(CommandResult {
            exit_code,
            stdout,
            stderr: if exit_code == 0 {
                String::new()
            } else {
                format!("{} exploded", invocation.program)
            },
        })
    }
}

/// Fake index service with scriptable health and reporting
pub struct FakeIndex {
    reachable: bool,
    reports: bool,
    count: u64,
    pings: AtomicUsize,
    counts: AtomicUsize,
    samples: AtomicUsize,
}

impl FakeIndex {
    pub fn healthy(count: u64) -> Self {
        Self {
            reachable: true,
            reports: true,
            count,
            pings: AtomicUsize::new(0),
            counts: AtomicUsize::new(0),
            samples: AtomicUsize::new(0),
        }
    }

    /// Ping fails
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::healthy(0)
        }
    }

    /// Ping succeeds but count and sample fail
    pub fn failing_reports() -> Self {
        Self {
            reports: false,
            ..Self::healthy(0)
        }
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn report_queries(&self) -> usize {
        self.counts.load(Ordering::SeqCst) + self.samples.load(Ordering::SeqCst)
    }

    fn status(&self, path: &str, status: u16) -> IndexError {
        IndexError::Status {
            url: format!("http://index.test{}", path),
            status,
        }
    }
}

#[async_trait]
impl IndexService for FakeIndex {
    fn index_name(&self) -> &str {
        "health-plans"
    }

    async fn ping(&self) -> Result<(), IndexError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            Ok(())
        } else {
            Err(self.status("/", 401))
        }
    }

    async fn count(&self) -> Result<u64, IndexError> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        if self.reports {
            Ok(self.count)
        } else {
            Err(self.status("/health-plans/_count", 503))
        }
    }

    async fn sample(&self, size: usize) -> Result<Vec<SampleDocument>, IndexError> {
        self.samples.fetch_add(1, Ordering::SeqCst);
        if !self.reports {
            return Err(self.status("/health-plans/_search", 503));
        }
        Ok((1..=size)
            .map(|i| SampleDocument {
                title: format!("Plan {}", i),
                category: "hmo".to_string(),
            })
            .collect())
    }
}

/// A pipeline whose stages run the given programs
///
/// Checks the container runtime and the index service first. Every stage
/// starts a service, so cleanup always has something to stop once a stage
/// has begun.
pub fn test_pipeline(stages: &[&str]) -> Pipeline {
    stages
        .iter()
        .fold(Pipeline::new("test"), |pipeline, name| {
            pipeline.stage(
                Stage::new(*name, Invocation::new(*name), format!("Running {}", name))
                    .starts_service(format!("{}-svc", name)),
            )
        })
        .require(Requirement::ContainerRuntime {
            program: "docker".to_string(),
        })
        .require(Requirement::IndexService)
        .with_teardown(Invocation::new("compose").arg("down"))
}

/// Everything observed during one run
pub struct RunResult {
    pub outcome: PipelineOutcome,
    pub events: Vec<ExecutionEvent>,
    pub calls: Vec<String>,
    pub pings: usize,
    pub report_queries: usize,
}

impl RunResult {
    /// Invocations whose command line contains `pattern`
    pub fn ran(&self, pattern: &str) -> usize {
        self.calls.iter().filter(|c| c.contains(pattern)).count()
    }

    /// Names of stages that were started, in order
    pub fn stages_started(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::StageStarted { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cleanups_finished(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ExecutionEvent::CleanupFinished { .. }))
            .count()
    }

    pub fn has_event(&self, pred: impl Fn(&ExecutionEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }

    /// Position of the first event matching `pred`
    pub fn position(&self, pred: impl Fn(&ExecutionEvent) -> bool) -> Option<usize> {
        self.events.iter().position(pred)
    }
}

/// Run a pipeline with fakes and no shutdown signal
pub async fn run_pipeline(pipeline: &Pipeline, runner: FakeRunner, index: FakeIndex) -> RunResult {
    run_pipeline_until(pipeline, runner, index, std::future::pending()).await
}

/// Run a pipeline with fakes, interrupting when `shutdown` resolves
pub async fn run_pipeline_until<F>(
    pipeline: &Pipeline,
    runner: FakeRunner,
    index: FakeIndex,
    shutdown: F,
) -> RunResult
where
    F: Future<Output = ()>,
{
    let engine = ExecutionEngine::new(runner, index);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event));

    let outcome = engine.execute(pipeline, shutdown).await;

    let events = events.lock().unwrap().clone();
    RunResult {
        outcome,
        events,
        calls: engine.runner().calls(),
        pings: engine.index().pings(),
        report_queries: engine.index().report_queries(),
    }
}

/// Assert the run ended with the given exit code and cleaned up exactly once
pub fn assert_finished(result: &RunResult, exit_code: i32) {
    assert_eq!(
        result.outcome.exit_code(),
        exit_code,
        "unexpected exit code, error: {:?}",
        result.outcome.error
    );
    assert_eq!(result.cleanups_finished(), 1, "cleanup must finish exactly once");
    assert!(matches!(
        result.events.last(),
        Some(ExecutionEvent::PipelineCompleted { .. })
    ));
}
