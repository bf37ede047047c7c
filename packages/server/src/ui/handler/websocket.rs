//! WebSocket connection handlers.

use std::{ops::ControlFlow, sync::Arc};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{IdentityError, RoomKey, UserId},
    infrastructure::{
        dto::websocket::{ChatRoomPayload, ClientEvent, PrivateMessagePayload},
        realtime::ConnectionHandle,
    },
    ui::state::{AppState, ConnectQuery},
    usecase::{
        ConnectError, ConnectUserUseCase, DisconnectUserUseCase, MarkAsReadUseCase,
        NotifyTypingUseCase, SendMessageCommand, SendPrivateMessageUseCase, TypingSignal,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let connect_usecase = ConnectUserUseCase::new(state.identity.clone(), state.hub.clone());

    match connect_usecase.authorize(query.user_id.as_deref()).await {
        Ok(user) => Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user))),
        Err(e) => {
            tracing::warn!(user_id = ?query.user_id, error = %e, "connection refused");
            Err(refusal_status(&e))
        }
    }
}

fn refusal_status(error: &ConnectError) -> StatusCode {
    match error {
        ConnectError::Rejected(IdentityError::Banned { .. }) => StatusCode::FORBIDDEN,
        ConnectError::Rejected(IdentityError::Repository(_)) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::UNAUTHORIZED,
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user: UserId) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = ConnectionHandle::new(tx);
    let connection = handle.id();

    ConnectUserUseCase::new(state.identity.clone(), state.hub.clone())
        .execute(&user, handle.clone())
        .await;

    let session = SocketSession {
        state: state.clone(),
        user: user.clone(),
        handle,
    };

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(user_id = %session.user, error = %e, "websocket error");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(user_id = %session.user, error = %e, "ignored malformed event");
                            continue;
                        }
                    };
                    if session.dispatch(event).await.is_break() {
                        break;
                    }
                }
                Message::Close(_) => {
                    tracing::debug!(user_id = %session.user, "client requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward queued events to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    DisconnectUserUseCase::new(state.hub.clone())
        .execute(connection)
        .await;
}

/// One authenticated connection
struct SocketSession {
    state: Arc<AppState>,
    user: UserId,
    handle: ConnectionHandle,
}

impl SocketSession {
    /// Handle one client event. `Break` closes the connection.
    async fn dispatch(&self, event: ClientEvent) -> ControlFlow<()> {
        tracing::debug!(user_id = %self.user, event = event.name(), "received event");

        match event {
            ClientEvent::Authenticate(claimed) => {
                if claimed != self.user.as_str() {
                    tracing::warn!(
                        user_id = %self.user,
                        claimed = %claimed,
                        "authenticate does not match connection, closing"
                    );
                    return ControlFlow::Break(());
                }
            }
            ClientEvent::GetOnlineUsers => {
                let usecase =
                    ConnectUserUseCase::new(self.state.identity.clone(), self.state.hub.clone());
                self.handle.send(&usecase.build_online_users().await);
            }
            ClientEvent::PrivateMessage(payload) => self.send_message(payload).await,
            ClientEvent::Typing(payload) => {
                self.relay_typing(&payload.receiver_id, TypingSignal::Started)
                    .await
            }
            ClientEvent::StopTyping(payload) => {
                self.relay_typing(&payload.receiver_id, TypingSignal::Stopped)
                    .await
            }
            ClientEvent::MessageRead(payload) => {
                let usecase =
                    MarkAsReadUseCase::new(self.state.messages.clone(), self.state.hub.clone());
                // Failures are reported to this connection by the use case
                let _ = usecase
                    .execute(&self.user, &payload.message_id, Some(&self.handle))
                    .await;
            }
            ClientEvent::JoinChat(payload) => {
                if let Some(room) = self.room_for(&payload) {
                    self.state.hub.join_room(room, &self.handle).await;
                }
            }
            ClientEvent::LeaveChat(payload) => {
                if let Some(room) = self.room_for(&payload) {
                    self.state.hub.leave_room(&room, self.handle.id()).await;
                }
            }
            ClientEvent::UserOffline(payload) => {
                DisconnectUserUseCase::new(self.state.hub.clone())
                    .announce_offline(&self.user, &payload.user_id)
                    .await;
            }
        }
        ControlFlow::Continue(())
    }

    async fn send_message(&self, payload: PrivateMessagePayload) {
        let usecase = SendPrivateMessageUseCase::new(
            self.state.messages.clone(),
            self.state.users.clone(),
            self.state.hub.clone(),
        );
        let command = SendMessageCommand {
            sender_id: self.user.clone(),
            receiver_id: payload.receiver_id,
            content: payload.content,
            temp_id: payload.temp_id,
        };
        // Failures are reported to this connection by the use case
        let _ = usecase.execute(command, Some(&self.handle)).await;
    }

    async fn relay_typing(&self, receiver_id: &str, signal: TypingSignal) {
        let usecase = NotifyTypingUseCase::new(self.state.hub.clone());
        if let Err(e) = usecase
            .execute(&self.user, receiver_id, signal, Some(self.handle.id()))
            .await
        {
            tracing::debug!(user_id = %self.user, error = %e, "ignored typing signal");
        }
    }

    /// The room between this connection's user and the requested peer.
    ///
    /// The room is always keyed on the connection's own identity; a payload
    /// naming another user is logged and corrected.
    fn room_for(&self, payload: &ChatRoomPayload) -> Option<RoomKey> {
        if payload.user_id != self.user.as_str() {
            tracing::warn!(
                user_id = %self.user,
                claimed = %payload.user_id,
                "room request names another user"
            );
        }
        match UserId::new(payload.other_user_id.clone()) {
            Ok(other) => Some(RoomKey::for_pair(&self.user, &other)),
            Err(e) => {
                tracing::debug!(user_id = %self.user, error = %e, "ignored room request");
                None
            }
        }
    }
}
