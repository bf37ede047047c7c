//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::{
        http::{ConversationDto, SendMessageRequest},
        websocket::MessageDto,
    },
    ui::{auth::AuthUser, error::ApiError, state::AppState},
    usecase::{
        GetConversationHistoryUseCase, ListConversationsUseCase, SendMessageCommand,
        SendPrivateMessageUseCase,
    },
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the caller's conversation list, newest first
pub async fn get_conversations(
    State(state): State<Arc<AppState>>,
    AuthUser(viewer): AuthUser,
) -> Result<Json<Vec<ConversationDto>>, ApiError> {
    let usecase = ListConversationsUseCase::new(state.messages.clone(), state.users.clone());
    let conversations = usecase.execute(&viewer).await?;
    Ok(Json(
        conversations.iter().map(ConversationDto::from).collect(),
    ))
}

/// Get the history with one peer, oldest first.
///
/// Unread messages from the peer are marked read as a side effect.
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(viewer): AuthUser,
    Path(peer_id): Path<String>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let usecase = GetConversationHistoryUseCase::new(
        state.messages.clone(),
        state.users.clone(),
        state.hub.clone(),
    );
    let history = usecase.execute(&viewer, &peer_id).await?;
    Ok(Json(history.iter().map(MessageDto::from).collect()))
}

/// Send a message without a realtime connection
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    AuthUser(sender): AuthUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let usecase = SendPrivateMessageUseCase::new(
        state.messages.clone(),
        state.users.clone(),
        state.hub.clone(),
    );
    let report = usecase
        .execute(
            SendMessageCommand {
                sender_id: sender,
                receiver_id: request.receiver_id,
                content: request.content,
                temp_id: None,
            },
            None,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(MessageDto::from(&report.message))))
}
