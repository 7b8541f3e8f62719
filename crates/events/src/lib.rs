//! JetStream event plumbing.
//!
//! [EventPub] publishes every origin-transaction status transition on
//! `CUSTODIAL.<trackingId>`; [EventSub] is a durable pull consumer on
//! `TRACKER.*` that reconciles chain confirmations back onto the ledger and
//! activates accounts once their registration lands.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use async_nats::jetstream;
use thiserror::Error;

mod publisher;
pub use publisher::EventPub;

mod subscriber;
pub use subscriber::{EventSub, TrackerEvent};

/// An error from the event plumbing.
#[derive(Error, Debug)]
pub enum EventsError {
    /// The NATS endpoint could not be reached.
    #[error("connecting to nats: {0}")]
    Connect(#[from] async_nats::ConnectError),
    /// The outbound stream could not be created.
    #[error("stream setup: {0}")]
    CreateStream(#[from] jetstream::context::CreateStreamError),
    /// The inbound stream is missing.
    #[error("stream lookup: {0}")]
    GetStream(#[from] jetstream::context::GetStreamError),
    /// The durable consumer could not be created.
    #[error("consumer setup: {0}")]
    Consumer(#[from] jetstream::stream::ConsumerError),
    /// The consumer message iterator could not be opened.
    #[error("consumer stream: {0}")]
    ConsumerStream(#[from] jetstream::consumer::StreamError),
    /// An outbound publish was rejected.
    #[error("publish: {0}")]
    Publish(#[from] jetstream::context::PublishError),
    /// An event payload failed to (de)serialize.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// A tracker payload carried malformed data.
    #[error("malformed tracker payload: {0}")]
    Payload(String),
    /// Reconciling an event against the ledger failed.
    #[error(transparent)]
    Store(#[from] custodia_store::StoreError),
}

/// Connects to NATS and returns a JetStream context.
pub async fn connect(url: &str) -> Result<jetstream::Context, EventsError> {
    let client = async_nats::connect(url).await?;
    Ok(jetstream::new(client))
}
