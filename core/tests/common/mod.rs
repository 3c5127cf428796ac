// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use sluice::adapters::memory::{InMemoryNotifier, InMemoryObjectSource, InMemoryStore};
use sluice::{
  standard_stages, Adapters, ErrorKind, Orchestrator, Payload, PayloadKind, PipelineConfig, PipelineRecord,
  SourceLocation, Stage, StageResult,
};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

pub const CONTAINER: &str = "uploads";

// --- In-memory world for the standard five-stage pipeline ---
pub struct Harness {
  pub objects: Arc<InMemoryObjectSource>,
  pub store: Arc<InMemoryStore>,
  pub notifier: Arc<InMemoryNotifier>,
  pub config: PipelineConfig,
}

impl Harness {
  pub fn new() -> Self {
    Self::with_config(PipelineConfig::default())
  }

  pub fn with_config(config: PipelineConfig) -> Self {
    Self {
      objects: Arc::new(InMemoryObjectSource::new()),
      store: Arc::new(InMemoryStore::new()),
      notifier: Arc::new(InMemoryNotifier::new()),
      config,
    }
  }

  pub fn adapters(&self) -> Adapters {
    Adapters::new(self.objects.clone(), self.store.clone(), self.notifier.clone())
  }

  pub fn orchestrator(&self) -> Orchestrator {
    let registry = standard_stages(&self.config, &self.adapters()).expect("standard stages");
    Orchestrator::new(registry).expect("runnable registry")
  }

  /// Uploads a CSV file and returns its location.
  pub fn upload_csv(&self, key: &str, body: &str) -> SourceLocation {
    let location = SourceLocation::new(CONTAINER, key);
    self.objects.insert(location.clone(), body.as_bytes().to_vec(), Some("text/csv"));
    location
  }
}

// --- Stages used to exercise the orchestrator in isolation ---

/// Succeeds with a fixed payload and counts its executions.
pub struct ScriptedStage {
  pub name: &'static str,
  pub input: PayloadKind,
  pub output: Payload,
  pub executions: Arc<AtomicUsize>,
}

impl ScriptedStage {
  pub fn new(name: &'static str, input: PayloadKind, output: Payload) -> Self {
    Self {
      name,
      input,
      output,
      executions: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn count(&self) -> usize {
    self.executions.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Stage for ScriptedStage {
  fn name(&self) -> &str {
    self.name
  }

  fn input_kind(&self) -> PayloadKind {
    self.input
  }

  fn output_kind(&self) -> PayloadKind {
    self.output.kind()
  }

  async fn execute(&self, _record: &PipelineRecord) -> StageResult {
    self.executions.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(target: "test_stages", stage = %self.name, "scripted stage executed");
    StageResult::Success(self.output.clone())
  }
}

/// Always fails with the given kind and message.
pub struct FailingStage {
  pub name: &'static str,
  pub input: PayloadKind,
  pub output: PayloadKind,
  pub kind: ErrorKind,
  pub message: &'static str,
}

#[async_trait]
impl Stage for FailingStage {
  fn name(&self) -> &str {
    self.name
  }

  fn input_kind(&self) -> PayloadKind {
    self.input
  }

  fn output_kind(&self) -> PayloadKind {
    self.output
  }

  async fn execute(&self, _record: &PipelineRecord) -> StageResult {
    tracing::warn!(target: "test_stages", stage = %self.name, "failing with: '{}'", self.message);
    StageResult::failure(self.kind, self.message)
  }
}

/// Panics when executed.
pub struct PanickingStage;

#[async_trait]
impl Stage for PanickingStage {
  fn name(&self) -> &str {
    "Panicky"
  }

  fn input_kind(&self) -> PayloadKind {
    PayloadKind::Source
  }

  fn output_kind(&self) -> PayloadKind {
    PayloadKind::Validated
  }

  async fn execute(&self, _record: &PipelineRecord) -> StageResult {
    panic!("boom in stage");
  }
}

pub fn validated_payload() -> Payload {
  Payload::Validated {
    content_length: 10,
    content_type: "text/csv".to_string(),
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
