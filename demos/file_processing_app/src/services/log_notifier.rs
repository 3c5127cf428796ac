// file_processing_app/src/services/log_notifier.rs
use async_trait::async_trait;
use sluice::Notifier;
use tracing::info;

/// Publishes completion messages as tracing events.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
  async fn publish(&self, message: &str) -> anyhow::Result<String> {
    let message_id = format!("log_{}", uuid::Uuid::new_v4());
    info!(target: "sluice_notifications", %message_id, "{}", message);
    Ok(message_id)
  }
}
