//! Connection handles.

use std::fmt;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::infrastructure::dto::websocket::ServerEvent;

/// Identifier of one live websocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to push frames to one live connection.
///
/// Frames go through the connection's writer task; sending never blocks. A
/// closed connection makes every send fail silently with `false`.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: ConnectionId::generate(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an already serialized frame
    pub fn send_raw(&self, frame: String) -> bool {
        self.sender.send(frame).is_ok()
    }

    /// Serialize and queue an event
    pub fn send(&self, event: &ServerEvent) -> bool {
        match encode(event) {
            Some(frame) => self.send_raw(frame),
            None => false,
        }
    }
}

/// Serialize an event into a text frame, logging failures
pub(crate) fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::error!(event = event.name(), error = %e, "failed to serialize event");
            None
        }
    }
}
