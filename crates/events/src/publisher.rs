//! Outbound status-event publisher.

use crate::EventsError;
use async_nats::jetstream::{
    self,
    stream::{Config as StreamConfig, StorageType},
};
use custodia_primitives::Event;
use std::time::Duration;
use tracing::debug;

/// Subject root and stream name of the outbound feed.
const PUSH_STREAM: &str = "CUSTODIAL";

/// Publishes status transitions on `CUSTODIAL.<trackingId>`.
///
/// Sends from workers are best-effort: callers log a publish failure and move
/// on rather than failing the surrounding transaction.
#[derive(Clone)]
pub struct EventPub {
    js: jetstream::Context,
}

impl std::fmt::Debug for EventPub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPub").field("stream", &PUSH_STREAM).finish()
    }
}

impl EventPub {
    /// Creates the publisher, provisioning the file-backed outbound stream
    /// with the configured retention window.
    pub async fn new(
        js: jetstream::Context,
        retention: Duration,
    ) -> Result<Self, EventsError> {
        js.get_or_create_stream(StreamConfig {
            name: PUSH_STREAM.to_string(),
            subjects: vec![format!("{PUSH_STREAM}.>")],
            storage: StorageType::File,
            max_age: retention,
            ..Default::default()
        })
        .await?;
        Ok(Self { js })
    }

    /// Publishes one status transition.
    pub async fn send(&self, event: Event) -> Result<(), EventsError> {
        let payload = event.serialize()?;
        let subject = format!("{PUSH_STREAM}.{}", event.tracking_id);
        // The server ack is not awaited; durability within the retention
        // window is the stream's concern, delivery is best-effort.
        self.js.publish(subject, payload.into()).await?;
        debug!(target: "pub", tracking_id = %event.tracking_id, status = %event.status, "published event");
        Ok(())
    }
}
