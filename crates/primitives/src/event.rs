//! Outbound status-transition events.

use crate::DispatchStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A status transition published on `CUSTODIAL.<trackingId>` for every
/// origin-transaction state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// The intent this transition belongs to.
    pub tracking_id: Uuid,
    /// The status the origin transaction moved to.
    pub status: DispatchStatus,
}

impl Event {
    /// Creates a new event.
    pub const fn new(tracking_id: Uuid, status: DispatchStatus) -> Self {
        Self { tracking_id, status }
    }

    /// Serializes the event to its JSON wire form.
    pub fn serialize(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserializes an event from its JSON wire form.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let event = Event::new(Uuid::new_v4(), DispatchStatus::InNetwork);
        let bytes = event.serialize().unwrap();
        assert_eq!(Event::deserialize(&bytes).unwrap(), event);
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let event = Event::new(Uuid::nil(), DispatchStatus::Pending);
        let json: serde_json::Value =
            serde_json::from_slice(&event.serialize().unwrap()).unwrap();
        assert_eq!(json["trackingId"], Uuid::nil().to_string());
        assert_eq!(json["status"], "PENDING");
    }
}
