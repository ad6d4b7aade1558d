//! Test: Success Chain - every prerequisite passes and every stage succeeds

use crate::helpers::*;
use corpus_pipeline::core::{OrchestratorConfig, Pipeline, PipelinePhase};
use corpus_pipeline::execution::ExecutionEvent;
use corpus_pipeline::ExecutionStatus;

#[tokio::test]
async fn test_all_stages_succeed() {
    let pipeline = test_pipeline(&["crawler", "processor"]);

    let result = run_pipeline(&pipeline, FakeRunner::new(), FakeIndex::healthy(42)).await;

    assert_finished(&result, 0);
    assert_eq!(result.outcome.status(), ExecutionStatus::Completed);
    assert_eq!(result.stages_started(), ["crawler", "processor"]);
    assert_eq!(result.ran("crawler"), 1);
    assert_eq!(result.ran("processor"), 1);
    assert_eq!(result.outcome.state.completed_stages, 2);
    assert_eq!(result.outcome.state.phase, PipelinePhase::CleanedUp);

    let summary = result.outcome.summary.as_ref().expect("summary printed");
    assert_eq!(summary.document_count, 42);
    assert_eq!(summary.sample_documents.len(), 3);
}

#[tokio::test]
async fn test_execution_order() {
    let pipeline = test_pipeline(&["first", "second", "third"]);

    let result = run_pipeline(&pipeline, FakeRunner::new(), FakeIndex::healthy(1)).await;

    // Probe, the stages in order, then teardown
    assert_eq!(
        result.calls,
        ["docker ps", "first", "second", "third", TEARDOWN]
    );
}

#[tokio::test]
async fn test_summary_precedes_cleanup() {
    let pipeline = test_pipeline(&["crawler"]);

    let result = run_pipeline(&pipeline, FakeRunner::new(), FakeIndex::healthy(5)).await;

    let reported = result
        .position(|e| matches!(e, ExecutionEvent::SummaryReported { .. }))
        .expect("summary reported");
    let cleanup = result
        .position(|e| matches!(e, ExecutionEvent::CleanupStarted { .. }))
        .expect("cleanup started");
    assert!(reported < cleanup);
}

#[tokio::test]
async fn test_stage_output_reaches_completion_event() {
    let pipeline = test_pipeline(&["crawler"]);

    let result = run_pipeline(&pipeline, FakeRunner::new(), FakeIndex::healthy(5)).await;

    assert!(result.has_event(|e| matches!(
        e,
        ExecutionEvent::StageCompleted { output, .. } if output.contains("ran crawler")
    )));
}

#[tokio::test]
async fn test_empty_pipeline_still_reports_and_cleans_up() {
    let pipeline = Pipeline::new("empty");

    let result = run_pipeline(&pipeline, FakeRunner::new(), FakeIndex::healthy(9)).await;

    assert_finished(&result, 0);
    assert!(result.calls.is_empty());
    assert_eq!(result.outcome.summary.map(|s| s.document_count), Some(9));
}

#[cfg(unix)]
#[tokio::test]
async fn test_builtin_crawl_pipeline_with_fakes() {
    use std::os::unix::fs::PermissionsExt;

    let bin = tempfile::tempdir().unwrap();
    for name in ["node", "pdftotext"] {
        let path = bin.path().join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let config = OrchestratorConfig {
        settle_secs: 0,
        ..OrchestratorConfig::default()
    };
    let pipeline = Pipeline::crawl(&config);

    let engine = corpus_pipeline::ExecutionEngine::new(FakeRunner::new(), FakeIndex::healthy(3))
        .with_search_path(bin.path().as_os_str());
    let outcome = engine.execute(&pipeline, std::future::pending()).await;

    assert_eq!(outcome.exit_code(), 0, "error: {:?}", outcome.error);
    assert_eq!(
        engine.runner().calls(),
        [
            "docker ps",
            "docker-compose up -d rabbitmq",
            "docker-compose up elastic-crawler",
            "node scripts/pdf-processor.js",
            "docker-compose down",
        ]
    );
}
