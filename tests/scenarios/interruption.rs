//! Test: Interruption - an external signal unwinds through cleanup

use crate::helpers::*;
use corpus_pipeline::core::{Invocation, Pipeline, PipelinePhase, Stage};
use corpus_pipeline::execution::{ExecutionEngine, ExecutionEvent, PipelineError};
use corpus_pipeline::ExecutionStatus;

/// Interruption during a stage: cleanup still runs, exit code 1
#[tokio::test]
async fn test_interrupted_during_stage() {
    let pipeline = test_pipeline(&["broker", "crawler", "processor"]);
    let runner = FakeRunner::new().hang_on("crawler");
    let hung = runner.hung();

    let result = run_pipeline_until(&pipeline, runner, FakeIndex::healthy(0), async move {
        hung.notified().await;
    })
    .await;

    assert_finished(&result, 1);
    assert_eq!(result.outcome.status(), ExecutionStatus::Interrupted);
    assert_eq!(result.outcome.error, Some(PipelineError::Interrupted));
    assert_eq!(result.ran("processor"), 0);
    assert_eq!(result.ran(TEARDOWN), 1);
    assert_eq!(result.outcome.state.phase, PipelinePhase::CleanedUp);
}

#[tokio::test]
async fn test_interrupted_event_names_phase_before_cleanup() {
    let pipeline = test_pipeline(&["broker", "crawler"]);
    let runner = FakeRunner::new().hang_on("crawler");
    let hung = runner.hung();

    let result = run_pipeline_until(&pipeline, runner, FakeIndex::healthy(0), async move {
        hung.notified().await;
    })
    .await;

    let interrupted = result
        .position(|e| matches!(e, ExecutionEvent::Interrupted { phase: PipelinePhase::Stage(2) }))
        .expect("interruption reported at stage 2");
    let cleanup = result
        .position(|e| matches!(e, ExecutionEvent::CleanupFinished { .. }))
        .expect("cleanup finished");
    assert!(interrupted < cleanup);
}

/// The stage that was interrupted already registered its service
#[tokio::test]
async fn test_interrupted_service_start_is_torn_down() {
    let pipeline = test_pipeline(&["broker"]);
    let runner = FakeRunner::new().hang_on("broker");
    let hung = runner.hung();

    let result = run_pipeline_until(&pipeline, runner, FakeIndex::healthy(0), async move {
        hung.notified().await;
    })
    .await;

    assert!(result.has_event(|e| matches!(
        e,
        ExecutionEvent::CleanupStarted { services } if services == &["broker-svc".to_string()]
    )));
    assert_eq!(result.ran(TEARDOWN), 1);
}

#[tokio::test]
async fn test_signal_before_start_runs_nothing() {
    let pipeline = test_pipeline(&["crawler"]);

    let result = run_pipeline_until(&pipeline, FakeRunner::new(), FakeIndex::healthy(0), async {}).await;

    assert_finished(&result, 1);
    assert!(result.calls.is_empty());
    assert_eq!(result.pings, 0);
}

/// A real child process is killed when the run is interrupted
#[cfg(unix)]
#[tokio::test]
async fn test_interrupt_kills_real_child() {
    use corpus_pipeline::process::SubprocessRunner;
    use std::time::{Duration, Instant};

    let pipeline = Pipeline::new("sleepy")
        .stage(
            Stage::new("sleep", Invocation::new("sleep").arg("30"), "Sleeping")
                .starts_service("sleeper"),
        )
        .with_teardown(Invocation::new("true"));

    let engine = ExecutionEngine::new(SubprocessRunner::new(), FakeIndex::healthy(0)).without_report();

    let started = Instant::now();
    let outcome = engine
        .execute(&pipeline, tokio::time::sleep(Duration::from_millis(200)))
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(outcome.status(), ExecutionStatus::Interrupted);
    assert_eq!(outcome.exit_code(), 1);
}
