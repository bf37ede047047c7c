//! Optimistic send bookkeeping.
//!
//! Every outgoing message is shown immediately under a temporary id and then
//! reconciled against the server's acknowledgements. Entries move
//! `Pending -> Sent | Delivered -> Read`, or to `Error` when no confirmation
//! arrives before the send deadline. The ledger is pure: time is passed in as
//! [`Instant`]s so deadlines are testable without a transport.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use kizuna_server::infrastructure::dto::websocket::{
    ClientEvent, DeliveryAckPayload, MessageDto, MessageErrorPayload, PrivateMessagePayload,
};
use uuid::Uuid;

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

const TEMP_ID_PREFIX: &str = "temp-";
const TIMEOUT_ERROR: &str = "No confirmation from server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Error,
    Sent,
    Delivered,
    Read,
}

impl DeliveryState {
    fn rank(self) -> u8 {
        match self {
            Self::Pending | Self::Error => 0,
            Self::Sent => 1,
            Self::Delivered => 2,
            Self::Read => 3,
        }
    }

    /// Move forward only; a confirmation also clears `Error`
    fn advance(&mut self, to: DeliveryState) {
        if to.rank() > self.rank() {
            *self = to;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Server id once confirmed, temporary id before
    pub id: String,
    pub temp_id: Option<String>,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    /// Milliseconds since epoch (UTC)
    pub created_at: i64,
    pub state: DeliveryState,
    pub error: Option<String>,
}

impl LedgerEntry {
    pub fn is_temporary(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }
}

pub struct MessageLedger {
    me: String,
    entries: Vec<LedgerEntry>,
    /// temp id -> confirmation deadline
    deadlines: HashMap<String, Instant>,
    send_timeout: Duration,
}

impl MessageLedger {
    pub fn new(me: impl Into<String>, send_timeout: Duration) -> Self {
        Self {
            me: me.into(),
            entries: Vec::new(),
            deadlines: HashMap::new(),
            send_timeout,
        }
    }

    /// Record an optimistic entry and build the event that sends it.
    pub fn submit(
        &mut self,
        receiver_id: &str,
        content: &str,
        created_at: i64,
        now: Instant,
    ) -> ClientEvent {
        let temp_id = format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4());
        self.entries.push(LedgerEntry {
            id: temp_id.clone(),
            temp_id: Some(temp_id.clone()),
            sender_id: self.me.clone(),
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            created_at,
            state: DeliveryState::Pending,
            error: None,
        });
        self.deadlines
            .insert(temp_id.clone(), now + self.send_timeout);

        ClientEvent::PrivateMessage(PrivateMessagePayload {
            content: content.to_string(),
            receiver_id: receiver_id.to_string(),
            temp_id: Some(temp_id),
        })
    }

    /// Apply `messageDelivered` / `messageSent`. Returns the id of the
    /// affected entry.
    pub fn confirm(&mut self, ack: &DeliveryAckPayload, outcome: DeliveryState) -> Option<String> {
        if let Some(temp_id) = &ack.temp_id
            && let Some(position) = self.position(temp_id)
        {
            self.deadlines.remove(temp_id);

            // The self-echo may already have added the server entry
            if let Some(existing) = self.position(&ack.message_id) {
                let pending = self.entries.remove(position);
                let existing = if existing > position { existing - 1 } else { existing };
                let entry = &mut self.entries[existing];
                entry.temp_id = pending.temp_id;
                entry.state.advance(outcome);
                return Some(ack.message_id.clone());
            }

            let entry = &mut self.entries[position];
            entry.id = ack.message_id.clone();
            entry.error = None;
            entry.state.advance(outcome);
            return Some(ack.message_id.clone());
        }

        let position = self.position(&ack.message_id)?;
        self.entries[position].state.advance(outcome);
        Some(ack.message_id.clone())
    }

    /// Apply `messageError`. Only errors naming a known temp id change state.
    pub fn on_message_error(&mut self, payload: &MessageErrorPayload) -> bool {
        let Some(temp_id) = &payload.temp_id else {
            return false;
        };
        let Some(position) = self.position(temp_id) else {
            return false;
        };
        self.deadlines.remove(temp_id);
        let entry = &mut self.entries[position];
        entry.state = DeliveryState::Error;
        entry.error = Some(payload.error.clone());
        true
    }

    /// Apply `messageRead` for a message this client sent.
    pub fn on_read(&mut self, message_id: &str) -> bool {
        match self.position(message_id) {
            Some(position) if self.entries[position].sender_id == self.me => {
                self.entries[position].state.advance(DeliveryState::Read);
                true
            }
            _ => false,
        }
    }

    /// Add a `newMessage` (or a history row). Returns `false` for a duplicate.
    pub fn on_incoming(&mut self, message: &MessageDto) -> bool {
        if let Some(position) = self.position(&message.id) {
            // The server's record replaces the optimistic copy
            let entry = &mut self.entries[position];
            entry.created_at = message.created_at;
            entry.content = message.content.clone();
            if message.read {
                entry.state.advance(DeliveryState::Read);
            }
            return false;
        }

        let state = match (message.read, message.sender_id == self.me) {
            (true, _) => DeliveryState::Read,
            (false, true) => DeliveryState::Sent,
            (false, false) => DeliveryState::Delivered,
        };
        self.entries.push(LedgerEntry {
            id: message.id.clone(),
            temp_id: None,
            sender_id: message.sender_id.clone(),
            receiver_id: message.receiver_id.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
            state,
            error: None,
        });
        true
    }

    /// Merge a page of history through the same dedup path. Returns how many
    /// entries were new.
    pub fn merge_history(&mut self, history: &[MessageDto]) -> usize {
        history.iter().filter(|m| self.on_incoming(m)).count()
    }

    /// Mark every entry whose deadline has passed as `Error`. Returns the
    /// expired temp ids.
    pub fn expire(&mut self, now: Instant) -> Vec<String> {
        let mut expired: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(temp_id, _)| temp_id.clone())
            .collect();
        expired.sort();

        for temp_id in &expired {
            self.deadlines.remove(temp_id);
            if let Some(position) = self.position(temp_id) {
                let entry = &mut self.entries[position];
                entry.state = DeliveryState::Error;
                entry.error = Some(TIMEOUT_ERROR.to_string());
            }
        }
        expired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Messages exchanged with `peer` in `created_at` order
    pub fn timeline(&self, peer: &str) -> Vec<&LedgerEntry> {
        let mut timeline: Vec<&LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| {
                (e.sender_id == self.me && e.receiver_id == peer)
                    || (e.sender_id == peer && e.receiver_id == self.me)
            })
            .collect();
        timeline.sort_by_key(|e| e.created_at);
        timeline
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}
