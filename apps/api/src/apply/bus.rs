//! In-process message bus for talking to a browser-extension bridge.
//!
//! The channel carries raw JSON values, like a host `postMessage` would, so
//! unrelated traffic can share it. Messages belonging to auto-apply are tagged
//! with [`BUS_MARKER`]; subscribers silently skip everything else.
//!
//! Delivery is fire-and-forget: posting with no subscribers is not an error,
//! there is no acknowledgement, and a subscriber that falls behind the channel
//! capacity loses the oldest messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::apply::payload::ApplyPayload;

/// Marker field present (and `true`) on every auto-apply message.
pub const BUS_MARKER: &str = "__careerOps";

const CHANNEL_CAPACITY: usize = 64;

/// Outcome reported back by the extension after it tried to fill a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Job the result refers to, when the extension echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusMessage {
    ApplyStart(ApplyPayload),
    ApplyResult(ApplyResult),
}

impl BusMessage {
    /// Wire form: `{ "__careerOps": true, "type": ..., "payload": ... }`.
    pub fn to_wire(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.insert(BUS_MARKER.to_string(), Value::Bool(true));
        }
        value
    }

    /// Decodes a raw host message. Returns `None` for anything not ours.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.get(BUS_MARKER) != Some(&Value::Bool(true)) {
            return None;
        }
        let mut map = map.clone();
        map.remove(BUS_MARKER);
        match serde_json::from_value(Value::Object(map)) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Dropping malformed bus message: {e}");
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageBus {
    sender: broadcast::Sender<Value>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcasts an auto-apply message. Returns how many subscribers saw it.
    pub fn post(&self, message: &BusMessage) -> usize {
        self.post_raw(message.to_wire())
    }

    /// Broadcasts an arbitrary host message, marked or not.
    pub fn post_raw(&self, value: Value) -> usize {
        match self.sender.send(value) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("Bus message posted with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> BusSubscription {
        BusSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[derive(Debug)]
pub struct BusSubscription {
    receiver: broadcast::Receiver<Value>,
}

impl BusSubscription {
    /// Next auto-apply message, skipping unrelated traffic.
    /// `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(value) => {
                    if let Some(message) = BusMessage::from_wire(&value) {
                        return Some(message);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Bus subscriber lagged, skipped {skipped} messages");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
