// sluice_core/examples/file_pipeline.rs

use sluice::adapters::memory::{InMemoryNotifier, InMemoryObjectSource, InMemoryStore};
use sluice::{standard_stages, Adapters, Orchestrator, PipelineConfig, SluiceError, SourceLocation, TriggerAdapter};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), SluiceError> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- File Pipeline Example ---");

  // 1. Build the process-wide adapters once
  let objects = Arc::new(InMemoryObjectSource::new());
  let store = Arc::new(InMemoryStore::new());
  let notifier = Arc::new(InMemoryNotifier::new());
  let adapters = Adapters::new(objects.clone(), store.clone(), notifier.clone());

  // 2. Upload a couple of files
  objects.insert(
    SourceLocation::new("uploads", "people.csv"),
    "\u{feff}name,age\nAlice,30\nBob,41\n",
    Some("text/csv; charset=utf-8"),
  );
  objects.insert(SourceLocation::new("uploads", "photo.png"), vec![0x89, b'P', b'N', b'G'], Some("image/png"));

  // 3. Standard stages -> orchestrator -> trigger adapter
  let registry = standard_stages(&PipelineConfig::default(), &adapters)?;
  info!("Stages: {:?}", registry.names());
  let mut orchestrator = Orchestrator::new(registry)?;
  orchestrator.on_stage_exit(|exit| info!("  {} finished in {:?}", exit.stage_name, exit.elapsed));
  let trigger = TriggerAdapter::for_orchestrator(Arc::new(orchestrator));

  // 4. Deliver a notification naming both files
  let notification = r#"{
    "Records": [
      { "s3": { "bucket": { "name": "uploads" }, "object": { "key": "people.csv" } } },
      { "s3": { "bucket": { "name": "uploads" }, "object": { "key": "photo.png" } } }
    ]
  }"#;
  let outcomes = trigger.handle_notification(notification).await?;

  // 5. Inspect the results
  for outcome in &outcomes {
    match outcome.error() {
      None => info!("{} completed: {:?}", outcome.record().source(), outcome.record().payload()),
      Some(error) => info!(
        "{} failed at {} with {}: {}",
        outcome.record().source(),
        error.stage,
        error.kind,
        error.message
      ),
    }
  }
  for (key, item) in store.snapshot() {
    info!("stored {} => {:?}", key, item);
  }
  info!("Notifications: {:?}", notifier.messages());

  info!("--- File Pipeline Example Complete ---");
  Ok(())
}
