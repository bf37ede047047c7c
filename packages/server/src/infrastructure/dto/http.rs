//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

use kizuna_shared::time::millis_to_rfc3339;

use crate::domain::ConversationSummary;

/// Conversation list entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    /// Peer user id
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub last_message: String,
    pub last_message_time: String, // ISO 8601
    pub unread_count: usize,
}

impl From<&ConversationSummary> for ConversationDto {
    fn from(summary: &ConversationSummary) -> Self {
        Self {
            id: summary.peer.id.to_string(),
            name: summary.peer.name.clone(),
            avatar: summary.peer.avatar.clone(),
            last_message: summary.last_message.to_string(),
            last_message_time: millis_to_rfc3339(summary.last_message_at.value()),
            unread_count: summary.unread_count,
        }
    }
}

/// Body of `POST /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
    pub receiver_id: String,
}

/// Error body shared by all endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
