//! Test: Failure Handling - fail-fast on the first failing stage

use crate::helpers::*;
use corpus_pipeline::execution::{ExecutionEvent, PipelineError};
use corpus_pipeline::ExecutionStatus;

/// Second of two stages fails: exactly two stage invocations
#[tokio::test]
async fn test_second_of_two_fails() {
    let pipeline = test_pipeline(&["crawler", "processor"]);
    let runner = FakeRunner::new().exit_with("processor", 1);

    let result = run_pipeline(&pipeline, runner, FakeIndex::healthy(0)).await;

    assert_finished(&result, 1);
    assert_eq!(result.outcome.status(), ExecutionStatus::Failed);
    assert_eq!(result.stages_started(), ["crawler", "processor"]);
    assert_eq!(result.ran("crawler") + result.ran("processor"), 2);
    assert!(matches!(
        result.outcome.error,
        Some(PipelineError::Stage { ordinal: 2, exit_code: Some(1), .. })
    ));
}

/// Stages after the failing one are never invoked
#[tokio::test]
async fn test_later_stages_never_run() {
    let stages = ["one", "two", "three", "four", "five"];

    for failing in 0..stages.len() {
        let pipeline = test_pipeline(&stages);
        let runner = FakeRunner::new().exit_with(stages[failing], 2);

        let result = run_pipeline(&pipeline, runner, FakeIndex::healthy(0)).await;

        assert_finished(&result, 1);
        for (i, stage) in stages.iter().enumerate() {
            let expected = usize::from(i <= failing);
            assert_eq!(
                result.ran(stage),
                expected,
                "stage {} when stage {} fails",
                stage,
                stages[failing]
            );
        }
    }
}

#[tokio::test]
async fn test_failure_skips_reporting() {
    let pipeline = test_pipeline(&["crawler"]);
    let runner = FakeRunner::new().exit_with("crawler", 1);

    let result = run_pipeline(&pipeline, runner, FakeIndex::healthy(10)).await;

    assert_finished(&result, 1);
    assert_eq!(result.report_queries, 0);
    assert!(result.outcome.summary.is_none());
}

#[tokio::test]
async fn test_failure_carries_diagnostics() {
    let pipeline = test_pipeline(&["crawler"]);
    let runner = FakeRunner::new().exit_with("crawler", 4);

    let result = run_pipeline(&pipeline, runner, FakeIndex::healthy(0)).await;

    assert!(result.has_event(|e| matches!(
        e,
        ExecutionEvent::StageFailed { exit_code: Some(4), diagnostics, .. }
            if diagnostics == "crawler exploded"
    )));
}

#[tokio::test]
async fn test_unspawnable_stage_fails_pipeline() {
    let pipeline = test_pipeline(&["missing-tool", "after"]);
    let runner = FakeRunner::new().unspawnable("missing-tool");

    let result = run_pipeline(&pipeline, runner, FakeIndex::healthy(0)).await;

    assert_finished(&result, 1);
    assert_eq!(result.ran("after"), 0);
    assert!(matches!(
        result.outcome.error,
        Some(PipelineError::Stage { exit_code: None, .. })
    ));
}
