// tests/pipeline_execution_tests.rs
mod common; // Reference the common module

use common::*;
use parking_lot::Mutex;
use sluice::{
  ErrorKind, Orchestrator, Payload, PayloadKind, PipelineOutcome, RunState, SluiceError, SourceLocation,
  StageRegistry, StageResult,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn three_stage_registry() -> (StageRegistry, Arc<ScriptedStage>, Arc<ScriptedStage>, Arc<ScriptedStage>) {
  let first = Arc::new(ScriptedStage::new("first", PayloadKind::Source, validated_payload()));
  let second = Arc::new(ScriptedStage::new("second", PayloadKind::Validated, Payload::Rows(vec![])));
  let third = Arc::new(ScriptedStage::new("third", PayloadKind::Rows, Payload::Items(vec![])));
  let mut registry = StageRegistry::new();
  registry.push(first.clone()).unwrap();
  registry.push(second.clone()).unwrap();
  registry.push(third.clone()).unwrap();
  (registry, first, second, third)
}

#[tokio::test]
async fn test_runs_stages_in_order_and_threads_payload() {
  setup_tracing();
  let (registry, first, second, third) = three_stage_registry();
  let mut orchestrator = Orchestrator::new(registry).unwrap();

  let entered = Arc::new(Mutex::new(Vec::new()));
  let entered_clone = entered.clone();
  orchestrator.on_stage_enter(move |e| {
    entered_clone
      .lock()
      .push((e.stage_name.to_string(), e.record.payload().kind()));
  });

  let outcome = orchestrator.run(SourceLocation::new("uploads", "a.csv")).await;

  assert!(outcome.is_completed());
  assert_eq!(outcome.record().payload(), &Payload::Items(vec![]));
  assert!(outcome.record().error_info().is_none());
  assert_eq!((first.count(), second.count(), third.count()), (1, 1, 1));
  assert_eq!(
    *entered.lock(),
    vec![
      ("first".to_string(), PayloadKind::Source),
      ("second".to_string(), PayloadKind::Validated),
      ("third".to_string(), PayloadKind::Rows),
    ]
  );
}

#[tokio::test]
async fn test_failure_halts_run_and_carries_triple_unmodified() {
  setup_tracing();
  let first = Arc::new(ScriptedStage::new("first", PayloadKind::Source, validated_payload()));
  let never = Arc::new(ScriptedStage::new("never", PayloadKind::Validated, Payload::Rows(vec![])));
  let mut registry = StageRegistry::new();
  registry.push(first.clone()).unwrap();
  registry.insert_after_stage("first", Arc::new(FailingStage {
    name: "bad",
    input: PayloadKind::Validated,
    output: PayloadKind::Validated,
    kind: ErrorKind::ExtractionError,
    message: "I am a bad stage!",
  })).unwrap();
  registry.push(never.clone()).unwrap();
  assert_eq!(registry.names(), vec!["first", "bad", "never"]);

  let orchestrator = Orchestrator::new(registry).unwrap();
  let outcome = orchestrator.run(SourceLocation::new("uploads", "a.csv")).await;

  match &outcome {
    PipelineOutcome::Failed { stage, error, record } => {
      assert_eq!(stage, "bad");
      assert_eq!(error.stage, "bad");
      assert_eq!(error.kind, ErrorKind::ExtractionError);
      assert_eq!(error.message, "I am a bad stage!");
      assert_eq!(record.error_info(), Some(error));
      // The payload is the last successful stage's output.
      assert_eq!(record.payload(), &validated_payload());
    }
    other => panic!("Expected Failed outcome, got {:?}", other),
  }
  assert_eq!(first.count(), 1);
  assert_eq!(never.count(), 0);
}

#[tokio::test]
async fn test_transitions_follow_the_state_machine() {
  setup_tracing();
  let (registry, _, _, _) = three_stage_registry();
  let mut orchestrator = Orchestrator::new(registry).unwrap();
  let states = Arc::new(Mutex::new(Vec::new()));
  let states_clone = states.clone();
  orchestrator.on_transition(move |t| states_clone.lock().push(t.state));

  let outcome = orchestrator.run(SourceLocation::new("uploads", "a.csv")).await;

  assert_eq!(outcome.state(), RunState::Succeeded);
  assert_eq!(
    *states.lock(),
    vec![
      RunState::Pending,
      RunState::Running(0),
      RunState::Running(1),
      RunState::Running(2),
      RunState::Succeeded,
    ]
  );
  let states = states.lock();
  let (last, earlier) = states.split_last().unwrap();
  assert!(last.is_terminal());
  assert!(earlier.iter().all(|state| !state.is_terminal()));
}

#[tokio::test]
async fn test_exit_hooks_see_each_result() {
  setup_tracing();
  let mut registry = StageRegistry::new();
  registry.push(Arc::new(ScriptedStage::new("first", PayloadKind::Source, validated_payload()))).unwrap();
  registry.push(Arc::new(FailingStage {
    name: "second",
    input: PayloadKind::Validated,
    output: PayloadKind::Rows,
    kind: ErrorKind::ExtractionError,
    message: "nope",
  })).unwrap();
  let mut orchestrator = Orchestrator::new(registry).unwrap();
  let exits = Arc::new(Mutex::new(Vec::new()));
  let exits_clone = exits.clone();
  orchestrator.on_stage_exit(move |e| exits_clone.lock().push((e.stage_index, e.result.is_success())));

  let outcome = orchestrator.run(SourceLocation::new("uploads", "a.csv")).await;
  assert_eq!(outcome.state(), RunState::Failed);
  assert_eq!(*exits.lock(), vec![(0, true), (1, false)]);
}

#[tokio::test]
async fn test_input_schema_mismatch_is_unknown_stage_error() {
  setup_tracing();
  let rows_consumer = Arc::new(ScriptedStage::new("wants_rows", PayloadKind::Rows, Payload::Items(vec![])));
  let mut registry = StageRegistry::new();
  registry.push(Arc::new(ScriptedStage::new("first", PayloadKind::Source, validated_payload()))).unwrap();
  registry.push(rows_consumer.clone()).unwrap();
  let orchestrator = Orchestrator::new(registry).unwrap();

  let outcome = orchestrator.run(SourceLocation::new("uploads", "a.csv")).await;

  let error = outcome.error().expect("run should fail");
  assert_eq!(error.stage, "wants_rows");
  assert_eq!(error.kind, ErrorKind::UnknownStageError);
  assert!(error.message.contains("expects a rows payload but received validated"), "got: {}", error.message);
  assert_eq!(rows_consumer.count(), 0, "mismatched stage must not be dispatched");
}

#[tokio::test]
async fn test_output_schema_mismatch_is_unknown_stage_error() {
  setup_tracing();
  struct Liar;
  #[async_trait::async_trait]
  impl sluice::Stage for Liar {
    fn name(&self) -> &str {
      "liar"
    }
    fn input_kind(&self) -> PayloadKind {
      PayloadKind::Source
    }
    fn output_kind(&self) -> PayloadKind {
      PayloadKind::Validated
    }
    async fn execute(&self, _record: &sluice::PipelineRecord) -> StageResult {
      StageResult::Success(Payload::Rows(vec![]))
    }
  }
  let mut registry = StageRegistry::new();
  registry.push(Arc::new(Liar)).unwrap();
  let orchestrator = Orchestrator::new(registry).unwrap();

  let outcome = orchestrator.run(SourceLocation::new("uploads", "a.csv")).await;
  let error = outcome.error().expect("run should fail");
  assert_eq!(error.kind, ErrorKind::UnknownStageError);
  assert_eq!(outcome.record().payload(), &Payload::Source);
}

#[tokio::test]
async fn test_panicking_stage_becomes_unknown_stage_error() {
  setup_tracing();
  let after = Arc::new(ScriptedStage::new("after", PayloadKind::Validated, Payload::Rows(vec![])));
  let mut registry = StageRegistry::new();
  registry.push(Arc::new(PanickingStage)).unwrap();
  registry.push(after.clone()).unwrap();
  let orchestrator = Orchestrator::new(registry).unwrap();

  let outcome = orchestrator.run(SourceLocation::new("uploads", "a.csv")).await;

  let error = outcome.error().expect("run should fail");
  assert_eq!(error.stage, "Panicky");
  assert_eq!(error.kind, ErrorKind::UnknownStageError);
  assert!(error.message.contains("boom in stage"));
  assert_eq!(after.count(), 0);
}

#[tokio::test]
async fn test_cancellation_stops_before_next_dispatch() {
  setup_tracing();
  let (registry, first, second, third) = three_stage_registry();
  let token = CancellationToken::new();
  let mut orchestrator = Orchestrator::new(registry).unwrap();
  let token_in_hook = token.clone();
  orchestrator.on_stage_exit(move |e| {
    if e.stage_name == "first" {
      token_in_hook.cancel();
    }
  });

  let outcome = orchestrator
    .run_until_cancelled(SourceLocation::new("uploads", "a.csv"), &token)
    .await;

  match &outcome {
    PipelineOutcome::Cancelled { next_stage, record } => {
      assert_eq!(next_stage, "second");
      assert_eq!(record.payload(), &validated_payload());
    }
    other => panic!("Expected Cancelled outcome, got {:?}", other),
  }
  assert_eq!((first.count(), second.count(), third.count()), (1, 0, 0));
}

#[tokio::test]
async fn test_uncancelled_token_runs_to_completion() {
  setup_tracing();
  let (registry, _, _, _) = three_stage_registry();
  let orchestrator = Orchestrator::new(registry).unwrap();
  let outcome = orchestrator
    .run_until_cancelled(SourceLocation::new("uploads", "a.csv"), &CancellationToken::new())
    .await;
  assert!(outcome.is_completed());
}

#[test]
fn test_empty_registry_is_rejected() {
  let result = Orchestrator::new(StageRegistry::new());
  assert!(matches!(result, Err(SluiceError::Configuration { .. })));
}

#[test]
fn test_registry_rejects_duplicates_and_unknown_anchors() {
  let mut registry = StageRegistry::new();
  registry.push(Arc::new(ScriptedStage::new("a", PayloadKind::Source, validated_payload()))).unwrap();

  let dup = registry.push(Arc::new(ScriptedStage::new("a", PayloadKind::Source, validated_payload())));
  assert!(matches!(dup, Err(SluiceError::DuplicateStage { ref stage_name }) if stage_name == "a"));

  let missing = registry.insert_before_stage(
    "zzz",
    Arc::new(ScriptedStage::new("b", PayloadKind::Source, validated_payload())),
  );
  assert!(matches!(missing, Err(SluiceError::StageNotFound { ref stage_name }) if stage_name == "zzz"));

  registry
    .insert_before_stage("a", Arc::new(ScriptedStage::new("b", PayloadKind::Source, validated_payload())))
    .unwrap();
  assert_eq!(registry.names(), vec!["b", "a"]);

  let removed = registry.remove_stage("b").unwrap();
  assert_eq!(removed.name(), "b");
  assert_eq!(registry.names(), vec!["a"]);
  assert!(registry.remove_stage("b").is_err());
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
  setup_tracing();
  let harness = Harness::new();
  let orchestrator = Arc::new(harness.orchestrator());
  let mut handles = Vec::new();
  for idx in 0..8 {
    let location = harness.upload_csv(&format!("file-{}.csv", idx), &format!("id,n\nrow{},{}\n", idx, idx));
    let orchestrator = orchestrator.clone();
    handles.push(tokio::spawn(async move { orchestrator.run(location).await }));
  }
  for handle in handles {
    let outcome = handle.await.unwrap();
    assert!(outcome.is_completed(), "{:?}", outcome);
  }
  assert_eq!(harness.store.len(), 8);
  assert_eq!(harness.notifier.messages().len(), 8);
}
