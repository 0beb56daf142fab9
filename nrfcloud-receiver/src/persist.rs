//! Persistence of telemetry batches.
//!
//! Messages are written one at a time, in delivery order. A failed write is
//! logged and skipped; it never stops the rest of the batch and never changes
//! the webhook response.

use serde_json::Value;
use tracing::{error, info};

use crate::payload::Message;
use crate::store::{DocumentStore, StoreError, StoredRecord, UNIQUE_ID};

/// Result of persisting a single message.
#[derive(Debug)]
pub enum MessageOutcome {
    Stored { document_id: String },
    Failed { device_id: String, error: PersistError },
}

/// Why a message could not be stored.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("message is not an object: {0}")]
    Malformed(serde_json::Error),
    #[error("payload could not be serialized: {0}")]
    Serialize(serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PersistError {
    /// HTTP status the store answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            PersistError::Store(e) => e.status(),
            _ => None,
        }
    }
}

/// Tally of a processed batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub stored: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &MessageOutcome) {
        match outcome {
            MessageOutcome::Stored { .. } => self.stored += 1,
            MessageOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Write every message of a batch to `database_id`/`collection_id`.
pub async fn persist_messages(
    store: &dyn DocumentStore,
    database_id: &str,
    collection_id: &str,
    messages: &[Value],
) -> BatchSummary {
    info!(
        message_count = messages.len(),
        database_id = %database_id,
        collection_id = %collection_id,
        "nrfcloud_batch_start"
    );

    let mut summary = BatchSummary::default();

    for (index, raw) in messages.iter().enumerate() {
        let outcome = persist_message(store, database_id, collection_id, raw).await;

        match &outcome {
            MessageOutcome::Stored { document_id } => {
                info!(index, document_id = %document_id, "nrfcloud_message_stored");
            }
            MessageOutcome::Failed { device_id, error } => {
                error!(
                    index,
                    device_id = %device_id,
                    status = ?error.status(),
                    error = %error,
                    "nrfcloud_message_store_failed"
                );
            }
        }

        summary.record(&outcome);
    }

    info!(
        stored = summary.stored,
        failed = summary.failed,
        "nrfcloud_batch_complete"
    );

    summary
}

async fn persist_message(
    store: &dyn DocumentStore,
    database_id: &str,
    collection_id: &str,
    raw: &Value,
) -> MessageOutcome {
    let device_id = raw
        .get("device_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let message = match Message::from_value(raw) {
        Ok(m) => m,
        Err(e) => {
            return MessageOutcome::Failed {
                device_id,
                error: PersistError::Malformed(e),
            }
        }
    };

    let record = match StoredRecord::from_message(&message) {
        Ok(r) => r,
        Err(e) => {
            return MessageOutcome::Failed {
                device_id,
                error: PersistError::Serialize(e),
            }
        }
    };

    match store
        .create_document(database_id, collection_id, UNIQUE_ID, &record)
        .await
    {
        Ok(created) => MessageOutcome::Stored {
            document_id: created.id,
        },
        Err(e) => MessageOutcome::Failed {
            device_id,
            error: e.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CreatedDocument;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Store that fails for configured device ids and records the rest.
    #[derive(Default)]
    struct FlakyStore {
        fail_devices: Vec<String>,
        attempts: Mutex<Vec<StoredRecord>>,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn create_document(
            &self,
            database_id: &str,
            collection_id: &str,
            document_id: &str,
            data: &StoredRecord,
        ) -> Result<CreatedDocument, StoreError> {
            assert_eq!(document_id, UNIQUE_ID);
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(data.clone());

            if data
                .device_id
                .as_ref()
                .is_some_and(|d| self.fail_devices.contains(d))
            {
                return Err(StoreError::Rejected {
                    status: 500,
                    kind: None,
                    message: "boom".to_string(),
                });
            }

            Ok(CreatedDocument {
                id: format!("doc-{}", attempts.len()),
                collection_id: collection_id.to_string(),
                database_id: database_id.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_persist_all_messages() {
        let store = FlakyStore::default();
        let messages = vec![
            json!({"device_id": "a", "appId": "TEMP", "ts": "t1", "payload": {"v": 1}}),
            json!({"device_id": "b", "appId": "TEMP", "ts": "t2", "payload": {"v": 2}}),
        ];

        let summary = persist_messages(&store, "db", "coll", &messages).await;

        assert_eq!(summary, BatchSummary { stored: 2, failed: 0 });
        let attempts = store.attempts.lock().unwrap();
        assert_eq!(attempts[0].payload.as_deref(), Some(r#"{"v":1}"#));
        assert_eq!(attempts[1].device_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let store = FlakyStore {
            fail_devices: vec!["b".to_string()],
            ..Default::default()
        };
        let messages = vec![
            json!({"device_id": "a"}),
            json!({"device_id": "b"}),
            json!({"device_id": "c"}),
        ];

        let summary = persist_messages(&store, "db", "coll", &messages).await;

        assert_eq!(summary, BatchSummary { stored: 2, failed: 1 });
        assert_eq!(store.attempts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped() {
        let store = FlakyStore::default();
        let messages = vec![json!(42), json!({"device_id": "a"})];

        let summary = persist_messages(&store, "db", "coll", &messages).await;

        assert_eq!(summary, BatchSummary { stored: 1, failed: 1 });
        assert_eq!(store.attempts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_outcome_carries_device_id() {
        let store = FlakyStore {
            fail_devices: vec!["nrf-9".to_string()],
            ..Default::default()
        };

        let outcome = persist_message(&store, "db", "coll", &json!({"device_id": "nrf-9"})).await;
        match outcome {
            MessageOutcome::Failed { device_id, error } => {
                assert_eq!(device_id, "nrf-9");
                assert!(matches!(error, PersistError::Store(_)));
                assert_eq!(error.status(), Some(500));
            }
            other => panic!("Expected failure, got {:?}", other),
        }

        let outcome = persist_message(&store, "db", "coll", &json!("nope")).await;
        match outcome {
            MessageOutcome::Failed { device_id, .. } => assert_eq!(device_id, "unknown"),
            other => panic!("Expected failure, got {:?}", other),
        }
    }
}
