// sluice/src/stages/notify.rs

use crate::adapters::Notifier;
use crate::config::PipelineConfig;
use crate::core::control::StageResult;
use crate::core::record::{Payload, PayloadKind, PipelineRecord};
use crate::core::stage::Stage;
use crate::error::{ErrorKind, StageError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, Level};

pub const NOTIFY_STAGE: &str = "Notify";

/// Announces that a file has been processed. A failed publish does not touch
/// anything already persisted.
pub struct NotifyStage {
  notifier: Arc<dyn Notifier>,
  message: String,
}

impl NotifyStage {
  pub fn new(notifier: Arc<dyn Notifier>, config: &PipelineConfig) -> Self {
    Self {
      notifier,
      message: config.completion_message.clone(),
    }
  }

  async fn notify(&self, _record: &PipelineRecord) -> Result<Payload, StageError> {
    let message_id = self
      .notifier
      .publish(&self.message)
      .await
      .map_err(|e| StageError::from_adapter(ErrorKind::NotificationError, "could not publish completion message", e))?;
    event!(Level::DEBUG, %message_id, "Completion message published.");
    Ok(Payload::Notified { message_id })
  }
}

#[async_trait]
impl Stage for NotifyStage {
  fn name(&self) -> &str {
    NOTIFY_STAGE
  }

  fn input_kind(&self) -> PayloadKind {
    PayloadKind::Persisted
  }

  fn output_kind(&self) -> PayloadKind {
    PayloadKind::Notified
  }

  async fn execute(&self, record: &PipelineRecord) -> StageResult {
    self.notify(record).await.into()
  }
}
