//! Typing indicators in both directions.
//!
//! [`TypingThrottle`] limits what this client emits: at most one `typing` per
//! window per receiver, followed by a `stopTyping` when the window closes.
//! [`TypingIndicators`] tracks which peers are typing; an indicator decays on
//! its own if the peer never sends `stopTyping`.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use kizuna_server::infrastructure::dto::websocket::{ClientEvent, TypingPayload};

pub const TYPING_WINDOW: Duration = Duration::from_secs(2);
pub const TYPING_TTL: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub struct TypingThrottle {
    window: Duration,
    /// receiver id -> window end
    open: HashMap<String, Instant>,
}

impl Default for TypingThrottle {
    fn default() -> Self {
        Self::new(TYPING_WINDOW)
    }
}

impl TypingThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            open: HashMap::new(),
        }
    }

    /// Register a keystroke toward `receiver_id`. Emits `typing` only when no
    /// window is open for that receiver.
    pub fn keystroke(&mut self, receiver_id: &str, now: Instant) -> Option<ClientEvent> {
        if self.open.contains_key(receiver_id) {
            return None;
        }
        self.open.insert(receiver_id.to_string(), now + self.window);
        Some(ClientEvent::Typing(TypingPayload {
            receiver_id: receiver_id.to_string(),
        }))
    }

    /// Close elapsed windows, emitting `stopTyping` for each.
    pub fn expire(&mut self, now: Instant) -> Vec<ClientEvent> {
        let mut closed: Vec<String> = self
            .open
            .iter()
            .filter(|(_, end)| **end <= now)
            .map(|(receiver, _)| receiver.clone())
            .collect();
        closed.sort();

        closed
            .into_iter()
            .map(|receiver_id| {
                self.open.remove(&receiver_id);
                ClientEvent::StopTyping(TypingPayload { receiver_id })
            })
            .collect()
    }

    /// Close the window for `receiver_id` now, e.g. when the message is sent.
    pub fn stop(&mut self, receiver_id: &str) -> Option<ClientEvent> {
        self.open.remove(receiver_id).map(|_| {
            ClientEvent::StopTyping(TypingPayload {
                receiver_id: receiver_id.to_string(),
            })
        })
    }
}

#[derive(Debug)]
pub struct TypingIndicators {
    ttl: Duration,
    /// peer id -> indicator expiry
    typing: HashMap<String, Instant>,
}

impl Default for TypingIndicators {
    fn default() -> Self {
        Self::new(TYPING_TTL)
    }
}

impl TypingIndicators {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            typing: HashMap::new(),
        }
    }

    /// Returns `true` if the peer was not already shown as typing.
    pub fn on_typing(&mut self, peer: &str, now: Instant) -> bool {
        self.typing.insert(peer.to_string(), now + self.ttl).is_none()
    }

    /// Returns `true` if an indicator was cleared.
    pub fn on_stop(&mut self, peer: &str) -> bool {
        self.typing.remove(peer).is_some()
    }

    pub fn is_typing(&self, peer: &str, now: Instant) -> bool {
        self.typing.get(peer).is_some_and(|expiry| *expiry > now)
    }

    /// Drop decayed indicators, returning the peers that stopped.
    pub fn expire(&mut self, now: Instant) -> Vec<String> {
        let mut stopped: Vec<String> = self
            .typing
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(peer, _)| peer.clone())
            .collect();
        stopped.sort();
        for peer in &stopped {
            self.typing.remove(peer);
        }
        stopped
    }
}
