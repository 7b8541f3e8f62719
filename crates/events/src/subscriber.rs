//! Durable tracker-event consumer.

use crate::{EventPub, EventsError};
use alloy_primitives::{Address, B256};
use async_nats::jetstream::{
    self,
    consumer::{pull, AckPolicy, Consumer},
    AckKind,
};
use custodia_primitives::{DispatchStatus, Event, OtxType};
use custodia_store::Pg;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

const PULL_STREAM: &str = "TRACKER";
const PULL_SUBJECT: &str = "TRACKER.*";
const REGISTRATION_SUBJECT: &str = "TRACKER.CUSTODIAL_REGISTRATION";

/// A chain event emitted by the external tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerEvent {
    /// Hash of the confirmed transaction.
    pub tx_hash: B256,
    /// Whether the execution succeeded.
    pub success: bool,
    /// Subject-specific extra data.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Durable pull consumer on `TRACKER.*`.
///
/// Each message is reconciled against the ledger inside one transaction:
/// confirmations finalize the dispatch status, registrations additionally
/// activate the freshly registered keypair. Unknown transaction hashes are
/// acked and dropped; handler errors negative-ack for redelivery.
pub struct EventSub {
    store: Pg,
    publisher: EventPub,
    consumer: Consumer<pull::Config>,
}

impl std::fmt::Debug for EventSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSub").field("subject", &PULL_SUBJECT).finish_non_exhaustive()
    }
}

impl EventSub {
    /// Builds the durable consumer.
    pub async fn new(
        js: &jetstream::Context,
        durable_id: &str,
        store: Pg,
        publisher: EventPub,
    ) -> Result<Self, EventsError> {
        let stream = js.get_stream(PULL_STREAM).await?;
        let consumer = stream
            .get_or_create_consumer(
                durable_id,
                pull::Config {
                    durable_name: Some(durable_id.to_string()),
                    filter_subject: PULL_SUBJECT.to_string(),
                    ack_policy: AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await?;
        Ok(Self { store, publisher, consumer })
    }

    /// Consumes messages until cancelled.
    pub async fn process(&self, cancel: CancellationToken) -> Result<(), EventsError> {
        let mut messages = self.consumer.messages().await?;
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break,
                message = messages.next() => message,
            };
            let message = match message {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    error!(target: "sub", "message iterator error: {e}");
                    continue;
                }
                None => break,
            };

            debug!(target: "sub", subject = %message.subject, "processing tracker message");
            match self.handle(message.subject.as_str(), &message.payload).await {
                Ok(()) => {
                    if let Err(e) = message.ack().await {
                        warn!(target: "sub", "ack failed: {e}");
                    }
                }
                Err(e) => {
                    error!(target: "sub", subject = %message.subject, "error processing tracker message: {e}");
                    if let Err(e) = message.ack_with(AckKind::Nak(None)).await {
                        warn!(target: "sub", "nak failed: {e}");
                    }
                }
            }
        }
        debug!(target: "sub", "closing tracker consumer");
        Ok(())
    }

    async fn handle(&self, subject: &str, payload: &[u8]) -> Result<(), EventsError> {
        let event: TrackerEvent = serde_json::from_slice(payload)?;

        let mut tx = self.store.begin().await?;
        let Some(otx) = self.store.get_otx_by_tx_hash(&mut tx, event.tx_hash).await? else {
            // Not one of ours.
            return Ok(());
        };

        let status =
            if event.success { DispatchStatus::Success } else { DispatchStatus::Reverted };

        if event.success
            && subject == REGISTRATION_SUBJECT
            && otx.otx_type == OtxType::AccountRegister
        {
            let account = event
                .payload
                .get("account")
                .and_then(|v| v.as_str())
                .ok_or_else(|| EventsError::Payload("registration without account".into()))?;
            let address: Address = account
                .parse()
                .map_err(|e| EventsError::Payload(format!("account address: {e}")))?;
            self.store.activate_keypair(&mut tx, address).await?;
            debug!(target: "sub", %address, "activated registered keypair");
        }

        let transitioned = self.store.update_dispatch(&mut tx, otx.id, status).await?;

        if let Err(e) = self.publisher.send(Event::new(otx.tracking_id, status)).await {
            warn!(target: "sub", tracking_id = %otx.tracking_id, "outbound publish failed: {e}");
        }

        tx.commit().await.map_err(custodia_store::StoreError::from)?;
        if !transitioned {
            debug!(target: "sub", otx_id = otx.id, "redelivered event for finalized otx");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_event_roundtrips() {
        let event = TrackerEvent {
            tx_hash: B256::repeat_byte(0x11),
            success: true,
            payload: serde_json::json!({"account": "0x0000000000000000000000000000000000000001"}),
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        assert_eq!(serde_json::from_slice::<TrackerEvent>(&bytes).unwrap(), event);
    }

    #[test]
    fn tracker_event_tolerates_missing_payload() {
        let event: TrackerEvent = serde_json::from_str(
            r#"{"txHash":"0x1111111111111111111111111111111111111111111111111111111111111111","success":false}"#,
        )
        .unwrap();
        assert!(!event.success);
        assert!(event.payload.is_null());
    }
}
