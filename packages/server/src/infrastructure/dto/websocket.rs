//! WebSocket event DTOs.
//!
//! Every text frame is one JSON object `{"event": <name>, "data": <payload>}`
//! with camelCase event names and payload keys. Events without a payload omit
//! `data`.

use serde::{Deserialize, Serialize};

use crate::domain::{MessageWithParticipants, UserSummary};

/// Events sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Re-confirm the connection's user id
    Authenticate(String),
    GetOnlineUsers,
    PrivateMessage(PrivateMessagePayload),
    Typing(TypingPayload),
    StopTyping(TypingPayload),
    #[serde(alias = "markAsRead")]
    MessageRead(MessageReadPayload),
    JoinChat(ChatRoomPayload),
    LeaveChat(ChatRoomPayload),
    UserOffline(UserOfflinePayload),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticate(_) => "authenticate",
            Self::GetOnlineUsers => "getOnlineUsers",
            Self::PrivateMessage(_) => "privateMessage",
            Self::Typing(_) => "typing",
            Self::StopTyping(_) => "stopTyping",
            Self::MessageRead(_) => "messageRead",
            Self::JoinChat(_) => "joinChat",
            Self::LeaveChat(_) => "leaveChat",
            Self::UserOffline(_) => "userOffline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessagePayload {
    pub content: String,
    pub receiver_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub receiver_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReadPayload {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomPayload {
    pub user_id: String,
    pub other_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOfflinePayload {
    pub user_id: String,
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    UserStatus(UserStatusPayload),
    OnlineUsers(OnlineUsersPayload),
    NewMessage(MessageDto),
    /// Persisted and pushed to a live receiver connection
    MessageDelivered(DeliveryAckPayload),
    /// Persisted while the receiver was offline
    MessageSent(DeliveryAckPayload),
    MessageRead(MessageReadPayload),
    UserTyping(TypingUserPayload),
    StopTyping(TypingUserPayload),
    MessageError(MessageErrorPayload),
}

impl ServerEvent {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserStatus(_) => "userStatus",
            Self::OnlineUsers(_) => "onlineUsers",
            Self::NewMessage(_) => "newMessage",
            Self::MessageDelivered(_) => "messageDelivered",
            Self::MessageSent(_) => "messageSent",
            Self::MessageRead(_) => "messageRead",
            Self::UserTyping(_) => "userTyping",
            Self::StopTyping(_) => "stopTyping",
            Self::MessageError(_) => "messageError",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusPayload {
    pub user_id: String,
    pub status: PresenceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsersPayload {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAckPayload {
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingUserPayload {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageErrorPayload {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
}

/// Display attributes of a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl From<&UserSummary> for UserSummaryDto {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// A persisted message with denormalized participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub content: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// Unix timestamp (milliseconds since epoch, UTC)
    pub created_at: i64,
    pub read: bool,
    pub sender: UserSummaryDto,
    pub receiver: UserSummaryDto,
}

impl From<&MessageWithParticipants> for MessageDto {
    fn from(view: &MessageWithParticipants) -> Self {
        let message = &view.message;
        Self {
            id: message.id.to_string(),
            content: message.content.to_string(),
            sender_id: message.sender_id.to_string(),
            receiver_id: message.receiver_id.to_string(),
            created_at: message.created_at.value(),
            read: message.is_read(),
            sender: UserSummaryDto::from(&view.sender),
            receiver: UserSummaryDto::from(&view.receiver),
        }
    }
}
