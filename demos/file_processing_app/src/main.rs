// file_processing_app/src/main.rs

// Declare modules for the application
mod config;
mod errors;
mod pipelines;
mod services;
mod state;

use crate::config::AppConfig;
use crate::errors::Result as AppResult;
use sluice::TriggerAdapter;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs go to stderr; stdout carries outcomes.
fn init_tracing(json: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .with_writer(std::io::stderr);
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

/// Runs every file named by one trigger payload and prints each outcome as a
/// JSON line. Returns whether all of them completed.
async fn process_trigger(adapter: &TriggerAdapter, raw: &str) -> AppResult<bool> {
  let outcomes = adapter.handle_notification(raw).await?;
  let mut all_completed = true;
  for outcome in &outcomes {
    all_completed &= outcome.is_completed();
    println!("{}", serde_json::to_string(outcome)?);
  }
  Ok(all_completed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let app_config = AppConfig::from_env()?;
  init_tracing(app_config.log_json);
  tracing::info!("Starting sluice file processor...");

  let adapters = state::init_adapters(&app_config).await?;
  let trigger_adapter = pipelines::build_trigger_adapter(&app_config, adapters)?;

  let mut all_completed = true;
  let mut record_result = |result: AppResult<bool>| match result {
    Ok(completed) => all_completed &= completed,
    Err(e) => {
      tracing::error!(error = %e, "Trigger could not be processed.");
      all_completed = false;
    }
  };

  let args: Vec<String> = std::env::args().skip(1).collect();
  if args.is_empty() {
    tracing::info!("Reading trigger payloads from stdin, one per line.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
      if line.trim().is_empty() {
        continue;
      }
      record_result(process_trigger(&trigger_adapter, &line).await);
    }
  } else {
    for raw in &args {
      record_result(process_trigger(&trigger_adapter, raw).await);
    }
  }

  if !all_completed {
    tracing::warn!("At least one run did not complete.");
    std::process::exit(1);
  }
  tracing::info!("All runs completed.");
  Ok(())
}
