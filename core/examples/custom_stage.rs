// sluice_core/examples/custom_stage.rs

use async_trait::async_trait;
use sluice::adapters::memory::{InMemoryNotifier, InMemoryObjectSource, InMemoryStore};
use sluice::stages::{EXTRACT_STAGE, TRANSFORM_STAGE};
use sluice::{
  standard_stages, Adapters, ErrorKind, Orchestrator, Payload, PayloadKind, PipelineConfig, PipelineRecord,
  SluiceError, SourceLocation, Stage, StageResult,
};
use std::sync::Arc;
use tracing::info;

// 1. A stage that drops rows whose `status` field is "inactive".
//    It sits between Extract and Transform, so it consumes and produces rows.
struct DropInactiveRows;

#[async_trait]
impl Stage for DropInactiveRows {
  fn name(&self) -> &str {
    "DropInactive"
  }

  fn input_kind(&self) -> PayloadKind {
    PayloadKind::Rows
  }

  fn output_kind(&self) -> PayloadKind {
    PayloadKind::Rows
  }

  async fn execute(&self, record: &PipelineRecord) -> StageResult {
    let Payload::Rows(rows) = record.payload() else {
      return StageResult::failure(ErrorKind::TransformationError, "expected rows");
    };
    let kept: Vec<_> = rows
      .iter()
      .filter(|row| row.get("status").and_then(|v| v.as_str()) != Some("inactive"))
      .cloned()
      .collect();
    info!("DropInactive: kept {} of {} rows", kept.len(), rows.len());
    StageResult::Success(Payload::Rows(kept))
  }
}

#[tokio::main]
async fn main() -> Result<(), SluiceError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Custom Stage Example ---");

  let objects = Arc::new(InMemoryObjectSource::new());
  let store = Arc::new(InMemoryStore::new());
  let adapters = Adapters::new(objects.clone(), store.clone(), Arc::new(InMemoryNotifier::new()));
  let location = SourceLocation::new("accounts", "2024-06.csv");
  objects.insert(
    location.clone(),
    "account,status\nA-1,active\nA-2,inactive\nA-3,active\n",
    Some("text/csv"),
  );

  // 2. Splice the custom stage into the standard sequence
  let mut registry = standard_stages(&PipelineConfig::default().with_key_field("account"), &adapters)?;
  registry.insert_after_stage(EXTRACT_STAGE, Arc::new(DropInactiveRows))?;
  info!("Stages: {:?}", registry.names());
  assert_eq!(registry.names()[3], TRANSFORM_STAGE);

  // 3. Run it for one file
  let outcome = Orchestrator::new(registry)?.run(location).await;
  info!("Outcome state: {:?}", outcome.state());
  info!("Stored keys: {:?}", store.snapshot().keys().collect::<Vec<_>>());

  info!("--- Custom Stage Example Complete ---");
  Ok(())
}
