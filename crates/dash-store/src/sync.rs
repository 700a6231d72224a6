//! Contract with the transport that carries `(topic, payload)` messages.
//!
//! The store only needs something to hand outbound messages to
//! ([`ServerSync`]); inbound messages are fed back with
//! [`Store::handle_message`]. Sockets, reconnects and buffering belong to the
//! transport.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::Store;

/// Topic of the connect handshake.
pub const CTRL_TOPIC: &str = "$ctrl";

/// How long [`RequestTracker`] waits for a correlated response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One protocol message.
///
/// Wire form is `{"kind": "set", "topic": .., "payload": ..}`; `kind` may be
/// omitted on inbound messages and then means `set`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SyncMessage {
    Set { topic: String, payload: Value },
    Unset { topic: String },
}

impl SyncMessage {
    pub fn topic(&self) -> &str {
        match self {
            SyncMessage::Set { topic, .. } | SyncMessage::Unset { topic } => topic,
        }
    }

    /// Parses an inbound frame.
    pub fn from_wire(text: &str) -> Result<Self, StoreError> {
        let mut frame: Value = serde_json::from_str(text).map_err(StoreError::Wire)?;
        if let Value::Object(fields) = &mut frame {
            fields
                .entry("kind")
                .or_insert_with(|| Value::String("set".to_string()));
        }
        serde_json::from_value(frame).map_err(StoreError::Wire)
    }

    pub fn to_wire(&self) -> Result<String, StoreError> {
        serde_json::to_string(self).map_err(StoreError::Wire)
    }
}

/// Receives outbound messages. Fire-and-forget: the store never waits on or
/// retries a send.
pub trait ServerSync {
    fn server_send(&mut self, message: SyncMessage);
}

impl<F> ServerSync for F
where
    F: FnMut(SyncMessage),
{
    fn server_send(&mut self, message: SyncMessage) {
        self(message)
    }
}

/// Outbox that keeps every message; clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct RecordingSync {
    sent: Arc<Mutex<Vec<SyncMessage>>>,
}

impl RecordingSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything sent so far.
    pub fn take(&self) -> Vec<SyncMessage> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ServerSync for RecordingSync {
    fn server_send(&mut self, message: SyncMessage) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

/// Handshake sent when a connection opens: `start` asks the server for the
/// full config, `continue` resumes a session that already has it.
pub fn ctrl_message(first_connect: bool, want_config: bool) -> SyncMessage {
    let payload = if first_connect && want_config {
        "start"
    } else {
        "continue"
    };
    SyncMessage::Set {
        topic: CTRL_TOPIC.to_string(),
        payload: Value::String(payload.to_string()),
    }
}

impl Store {
    /// Applies an inbound message: `set` writes, `unset` deletes.
    pub fn handle_message(&mut self, message: SyncMessage) -> Result<Option<Value>, StoreError> {
        match message {
            SyncMessage::Set { topic, payload } => self.insert_data(&topic, Some(payload)),
            SyncMessage::Unset { topic } => self.insert_data(&topic, None),
        }
    }
}

/// A request waiting for its response.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub topic: String,
    pub deadline: Duration,
}

/// Correlates outbound requests with responses by id and times out the
/// ones nobody answered. Sits next to the store, not inside it; `now` comes
/// from the caller's [`Clock`](dash_util::Clock).
#[derive(Debug, Clone)]
pub struct RequestTracker {
    timeout: Duration,
    next_id: u64,
    pending: BTreeMap<u64, PendingRequest>,
}

impl RequestTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Registers a request and returns its correlation id.
    pub fn begin(&mut self, topic: &str, now: Duration) -> u64 {
        self.next_id += 1;
        self.pending.insert(
            self.next_id,
            PendingRequest {
                topic: topic.to_string(),
                deadline: now.saturating_add(self.timeout),
            },
        );
        self.next_id
    }

    /// Matches a response. `None` for unknown or already expired ids.
    pub fn resolve(&mut self, id: u64, now: Duration) -> Option<PendingRequest> {
        let request = self.pending.remove(&id)?;
        (now < request.deadline).then_some(request)
    }

    /// Drops and returns every request past its deadline.
    pub fn expire(&mut self, now: Duration) -> Vec<(u64, PendingRequest)> {
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, r)| r.deadline <= now)
            .map(|(&id, _)| id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|r| (id, r)))
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inbound_frame_defaults_to_set() {
        let msg = SyncMessage::from_wire(r#"{"topic": "room/temp", "payload": 21}"#).unwrap();
        assert_eq!(
            msg,
            SyncMessage::Set {
                topic: "room/temp".to_string(),
                payload: json!(21)
            }
        );
    }

    #[test]
    fn unset_frame() {
        let msg = SyncMessage::from_wire(r#"{"kind": "unset", "topic": "room/temp"}"#).unwrap();
        assert_eq!(msg.topic(), "room/temp");
        assert!(matches!(msg, SyncMessage::Unset { .. }));
    }

    #[test]
    fn frame_without_payload_is_rejected() {
        assert!(SyncMessage::from_wire(r#"{"topic": "x"}"#).is_err());
        assert!(SyncMessage::from_wire("[1,2]").is_err());
    }

    #[test]
    fn wire_form() {
        let msg = SyncMessage::Set {
            topic: "$config/dash".to_string(),
            payload: json!({"title": "x"}),
        };
        assert_eq!(
            msg.to_wire().unwrap(),
            r#"{"kind":"set","topic":"$config/dash","payload":{"title":"x"}}"#
        );
    }

    #[test]
    fn handshake_payload() {
        let payload = |m: SyncMessage| match m {
            SyncMessage::Set { payload, .. } => payload,
            SyncMessage::Unset { .. } => Value::Null,
        };
        assert_eq!(payload(ctrl_message(true, true)), json!("start"));
        assert_eq!(payload(ctrl_message(true, false)), json!("continue"));
        assert_eq!(payload(ctrl_message(false, true)), json!("continue"));
    }

    #[test]
    fn requests_time_out_after_thirty_seconds() {
        let mut tracker = RequestTracker::default();
        let t0 = Duration::from_secs(100);
        let a = tracker.begin("upload", t0);
        let b = tracker.begin("upload", t0 + Duration::from_secs(10));

        assert!(tracker.expire(t0 + Duration::from_secs(29)).is_empty());
        let expired = tracker.expire(t0 + Duration::from_secs(30));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, a);

        assert!(tracker.resolve(b, t0 + Duration::from_secs(35)).is_some());
        assert!(tracker.resolve(b, t0 + Duration::from_secs(35)).is_none());
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn huge_timeouts_saturate() {
        let mut tracker = RequestTracker::new(Duration::MAX);
        let id = tracker.begin("upload", Duration::from_secs(100));
        assert!(tracker.expire(Duration::from_secs(1_000_000_000)).is_empty());
        assert!(tracker.resolve(id, Duration::from_secs(1_000_000_000)).is_some());
    }
}
