//! Core domain models for direct messaging.

use serde::{Deserialize, Serialize};

use super::{
    error::MessageError,
    value_object::{MessageContent, MessageId, Timestamp, UserId},
};

/// A persisted direct message.
///
/// `created_at` is assigned by the store and orders the messages of a
/// conversation. `read` only ever goes from `false` to `true`, and only on
/// behalf of the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: MessageContent,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub created_at: Timestamp,
    read: bool,
}

impl Message {
    /// Rebuild a message from stored fields
    pub fn new(
        id: MessageId,
        content: MessageContent,
        sender_id: UserId,
        receiver_id: UserId,
        created_at: Timestamp,
        read: bool,
    ) -> Self {
        Self {
            id,
            content,
            sender_id,
            receiver_id,
            created_at,
            read,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Whether `user` takes part in this message's conversation
    pub fn involves(&self, user: &UserId) -> bool {
        &self.sender_id == user || &self.receiver_id == user
    }

    /// The conversation partner of `viewer`
    pub fn peer_of(&self, viewer: &UserId) -> &UserId {
        if &self.sender_id == viewer {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }

    /// Check that `actor` may mark this message as read
    ///
    /// # Errors
    ///
    /// Returns `MessageError::NotReceiver` when `actor` is not the receiver
    pub fn authorize_read(&self, actor: &UserId) -> Result<(), MessageError> {
        if &self.receiver_id != actor {
            return Err(MessageError::NotReceiver {
                actor: actor.to_string(),
                message_id: self.id.to_string(),
            });
        }
        Ok(())
    }

    /// Mark the message as read on behalf of `actor`
    ///
    /// Returns `true` if the flag changed, `false` if it was already set.
    ///
    /// # Errors
    ///
    /// Returns `MessageError::NotReceiver` when `actor` is not the receiver
    pub fn mark_read(&mut self, actor: &UserId) -> Result<bool, MessageError> {
        self.authorize_read(actor)?;
        if self.read {
            return Ok(false);
        }
        self.read = true;
        Ok(true)
    }
}

/// Message fields supplied by the sender; id and timestamp come from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: MessageContent,
}

/// A registered user as seen by the messaging core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub avatar: Option<String>,
    pub banned: bool,
    pub ban_reason: Option<String>,
}

impl UserProfile {
    /// Create an active (not banned) user
    pub fn new(id: UserId, name: impl Into<String>, avatar: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar,
            banned: false,
            ban_reason: None,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Display attributes denormalized onto outbound messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub avatar: Option<String>,
}

impl UserSummary {
    /// Placeholder used when a participant's profile is gone
    pub fn unknown(id: UserId) -> Self {
        Self {
            id,
            name: "Unknown User".to_string(),
            avatar: None,
        }
    }
}

/// A message together with its participants' display attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWithParticipants {
    pub message: Message,
    pub sender: UserSummary,
    pub receiver: UserSummary,
}

/// One row of a user's conversation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub peer: UserSummary,
    pub last_message: MessageContent,
    pub last_message_at: Timestamp,
    pub unread_count: usize,
}
