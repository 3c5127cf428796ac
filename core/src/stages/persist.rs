// sluice/src/stages/persist.rs

use crate::adapters::DurableStore;
use crate::config::PipelineConfig;
use crate::core::control::StageResult;
use crate::core::record::{Payload, PayloadKind, PipelineRecord};
use crate::core::stage::Stage;
use crate::error::{ErrorKind, StageError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, Level};

pub const PERSIST_STAGE: &str = "Persist";

/// Writes every transformed item to the durable store, one put per item.
///
/// Writes are not atomic as a set. If item `n` fails, items before it stay
/// written and the stage reports `PersistenceError`; nothing is rolled back.
pub struct PersistStage {
  store: Arc<dyn DurableStore>,
  key_field: String,
}

impl PersistStage {
  pub fn new(store: Arc<dyn DurableStore>, config: &PipelineConfig) -> Self {
    Self {
      store,
      key_field: config.key_field.clone(),
    }
  }

  async fn persist(&self, record: &PipelineRecord) -> Result<Payload, StageError> {
    let items = match record.payload() {
      Payload::Items(items) => items,
      other => {
        return Err(StageError::Persistence(format!(
          "expected store items, got {} payload",
          other.kind()
        )))
      }
    };

    let mut keys = Vec::with_capacity(items.len());
    for (item_idx, item) in items.iter().enumerate() {
      let mut value = item.clone();
      let key = value
        .remove(&self.key_field)
        .map(|attr| attr.as_text().to_string())
        .ok_or_else(|| {
          StageError::Persistence(format!(
            "item {} has no '{}' attribute to key it by ({} of {} items written)",
            item_idx,
            self.key_field,
            keys.len(),
            items.len()
          ))
        })?;

      if let Err(e) = self.store.put(&key, value).await {
        event!(Level::WARN, %key, written = keys.len(), total = items.len(), "Store write failed; earlier writes are kept.");
        return Err(StageError::from_adapter(
          ErrorKind::PersistenceError,
          &format!("write of item {} failed ({} of {} items written)", item_idx, keys.len(), items.len()),
          e,
        ));
      }
      event!(Level::TRACE, %key, "Item written.");
      keys.push(key);
    }

    Ok(Payload::Persisted { keys })
  }
}

#[async_trait]
impl Stage for PersistStage {
  fn name(&self) -> &str {
    PERSIST_STAGE
  }

  fn input_kind(&self) -> PayloadKind {
    PayloadKind::Items
  }

  fn output_kind(&self) -> PayloadKind {
    PayloadKind::Persisted
  }

  async fn execute(&self, record: &PipelineRecord) -> StageResult {
    self.persist(record).await.into()
  }
}
