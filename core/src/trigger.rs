// sluice/src/trigger.rs

//! Turns "file created" notifications into pipeline runs: exactly one run per
//! file mentioned in a notification.
//!
//! Upstream event sources deliver at least once, so the same file may arrive
//! twice. That is safe because the stages are idempotent and persisted items
//! are keyed by file identity and row position.

use crate::core::control::PipelineOutcome;
use crate::core::record::SourceLocation;
use crate::error::{SluiceError, SluiceResult};
use crate::pipeline::execution::Orchestrator;
use crate::registry::Sluice;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// The minimal trigger: which file arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
  pub source_container: String,
  pub source_key: String,
}

impl TriggerEvent {
  pub fn new(source_container: impl Into<String>, source_key: impl Into<String>) -> Self {
    Self {
      source_container: source_container.into(),
      source_key: source_key.into(),
    }
  }
}

impl From<TriggerEvent> for SourceLocation {
  fn from(event: TriggerEvent) -> Self {
    SourceLocation::new(event.source_container, event.source_key)
  }
}

// Object-created notification as emitted by S3-compatible storage.
#[derive(Debug, Deserialize)]
struct ObjectNotification {
  #[serde(rename = "Records")]
  records: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
  s3: NotificationEntity,
}

#[derive(Debug, Deserialize)]
struct NotificationEntity {
  bucket: NamedRef,
  object: KeyedRef,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
  name: String,
}

#[derive(Debug, Deserialize)]
struct KeyedRef {
  key: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TriggerPayload {
  Notification(ObjectNotification),
  Single(TriggerEvent),
}

/// Parses either a bare `TriggerEvent` or an object-created notification into
/// one event per file. Notification keys are form-url-decoded.
pub fn parse_trigger(json: &str) -> SluiceResult<Vec<TriggerEvent>> {
  let payload: TriggerPayload = serde_json::from_str(json)
    .map_err(|e| SluiceError::invalid_trigger(format!("unrecognised trigger payload: {}", e)))?;

  let events = match payload {
    TriggerPayload::Single(event) => vec![event],
    TriggerPayload::Notification(notification) => {
      if notification.records.is_empty() {
        return Err(SluiceError::invalid_trigger("notification contains no records"));
      }
      notification
        .records
        .into_iter()
        .map(|record| {
          let key = decode_object_key(&record.s3.object.key)?;
          Ok(TriggerEvent::new(record.s3.bucket.name, key))
        })
        .collect::<SluiceResult<Vec<_>>>()?
    }
  };

  for event in &events {
    if event.source_container.is_empty() || event.source_key.is_empty() {
      return Err(SluiceError::invalid_trigger(format!(
        "trigger must name both a container and a key, got {:?}",
        event
      )));
    }
  }
  Ok(events)
}

/// Decodes `application/x-www-form-urlencoded` text: `+` is a space and
/// `%XX` is a byte. Every `%` must be followed by two hex digits.
pub fn decode_object_key(raw: &str) -> SluiceResult<String> {
  let bytes = raw.as_bytes();
  for (idx, _) in raw.match_indices('%') {
    let well_formed = bytes
      .get(idx + 1..idx + 3)
      .map_or(false, |hex| hex.iter().all(u8::is_ascii_hexdigit));
    if !well_formed {
      return Err(SluiceError::invalid_trigger(format!("bad percent escape in object key '{}'", raw)));
    }
  }

  percent_decode_str(&raw.replace('+', " "))
    .decode_utf8()
    .map(Cow::into_owned)
    .map_err(|_| SluiceError::invalid_trigger(format!("object key '{}' is not UTF-8 once decoded", raw)))
}

/// Bridges external notifications to pipeline runs.
#[derive(Clone)]
pub struct TriggerAdapter {
  sluice: Arc<Sluice>,
}

impl TriggerAdapter {
  pub fn new(sluice: Arc<Sluice>) -> Self {
    Self { sluice }
  }

  /// An adapter that sends every file to `orchestrator`.
  pub fn for_orchestrator(orchestrator: Arc<Orchestrator>) -> Self {
    let sluice = Sluice::new();
    sluice.register_default(orchestrator);
    Self::new(Arc::new(sluice))
  }

  /// Starts exactly one run for `event`.
  pub async fn handle(&self, event: TriggerEvent) -> SluiceResult<PipelineOutcome> {
    self.sluice.dispatch(event.into()).await
  }

  /// Parses `json` and runs each file it names, in order.
  ///
  /// A file whose container has no pipeline fails the whole call before any
  /// run starts.
  #[instrument(name = "TriggerAdapter::handle_notification", skip_all, err(Display))]
  pub async fn handle_notification(&self, json: &str) -> SluiceResult<Vec<PipelineOutcome>> {
    let events = parse_trigger(json)?;
    event!(Level::DEBUG, files = events.len(), "Trigger parsed.");

    let mut targets = Vec::with_capacity(events.len());
    for event in events {
      let source: SourceLocation = event.into();
      let orchestrator = self.sluice.resolve(source.container())?;
      targets.push((source, orchestrator));
    }

    let mut outcomes = Vec::with_capacity(targets.len());
    for (source, orchestrator) in targets {
      outcomes.push(orchestrator.run(source).await);
    }
    Ok(outcomes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_bare_trigger_event() {
    let events = parse_trigger(r#"{ "sourceContainer": "uploads", "sourceKey": "a.csv" }"#).unwrap();
    assert_eq!(events, vec![TriggerEvent::new("uploads", "a.csv")]);
  }

  #[test]
  fn parses_every_record_of_a_notification() {
    let json = r#"{
      "Records": [
        { "eventName": "ObjectCreated:Put", "s3": { "bucket": { "name": "uploads" }, "object": { "key": "reports/q1+2024.csv", "size": 12 } } },
        { "s3": { "bucket": { "name": "uploads" }, "object": { "key": "caf%C3%A9%20menu.csv" } } }
      ]
    }"#;
    let events = parse_trigger(json).unwrap();
    assert_eq!(
      events,
      vec![
        TriggerEvent::new("uploads", "reports/q1 2024.csv"),
        TriggerEvent::new("uploads", "café menu.csv"),
      ]
    );
  }

  #[test]
  fn rejects_empty_and_malformed_triggers() {
    assert!(matches!(parse_trigger(r#"{ "Records": [] }"#), Err(SluiceError::InvalidTrigger { .. })));
    assert!(matches!(parse_trigger("not json"), Err(SluiceError::InvalidTrigger { .. })));
    assert!(matches!(
      parse_trigger(r#"{ "sourceContainer": "", "sourceKey": "a.csv" }"#),
      Err(SluiceError::InvalidTrigger { .. })
    ));
  }

  #[test]
  fn rejects_truncated_percent_escape() {
    assert!(decode_object_key("bad%2").is_err());
    assert!(decode_object_key("bad%zz").is_err());
    assert_eq!(decode_object_key("plain/key.csv").unwrap(), "plain/key.csv");
  }

  #[test]
  fn rejects_signed_percent_escapes() {
    for raw in ["a%+1b", "a%-1b", "a%+b", "a% 1b"] {
      assert!(
        matches!(decode_object_key(raw), Err(SluiceError::InvalidTrigger { .. })),
        "{:?} should be rejected",
        raw
      );
    }
  }

  #[test]
  fn decodes_escaped_plus_and_percent_literally() {
    assert_eq!(decode_object_key("a%2Bb+c").unwrap(), "a+b c");
    assert_eq!(decode_object_key("100%25%20done").unwrap(), "100% done");
    assert!(matches!(decode_object_key("bad%FF"), Err(SluiceError::InvalidTrigger { .. })));
  }
}
