// file_processing_app/src/state.rs
use crate::config::AppConfig;
use crate::errors::Result;
use crate::services::{JsonLinesStore, LocalObjectSource, LogNotifier};
use once_cell::sync::OnceCell;
use sluice::Adapters;
use std::sync::Arc;

static ADAPTERS: OnceCell<Adapters> = OnceCell::new();

/// Builds the process-wide adapters on first call and returns the same handles afterwards.
pub async fn init_adapters(config: &AppConfig) -> Result<&'static Adapters> {
  if let Some(adapters) = ADAPTERS.get() {
    return Ok(adapters);
  }
  let store = JsonLinesStore::open(&config.store_path).await?;
  let adapters = Adapters::new(
    Arc::new(LocalObjectSource::new(&config.data_dir).with_read_limit(config.pipeline.max_file_size_bytes)),
    Arc::new(store),
    Arc::new(LogNotifier),
  );
  tracing::info!(
    data_dir = %config.data_dir.display(),
    store_path = %config.store_path.display(),
    "Adapters initialized."
  );
  Ok(ADAPTERS.get_or_init(|| adapters))
}
