//! Connection hub.
//!
//! The single owner of realtime shared state: the presence registry and the
//! room tables. Only the connection lifecycle mutates it: the websocket
//! handler joins and leaves rooms, and the connect/disconnect use cases
//! register presence. Every other use case only resolves handles and emits.

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{RoomKey, UserId},
    infrastructure::dto::websocket::ServerEvent,
};

use super::{
    connection::{ConnectionHandle, ConnectionId},
    presence::{ConnectOutcome, DisconnectOutcome, PresenceRegistry},
    rooms::RoomRegistry,
};

pub struct ConnectionHub {
    presence: Arc<PresenceRegistry>,
    rooms: RoomRegistry,
}

impl ConnectionHub {
    pub fn new(offline_grace: Duration) -> Self {
        Self {
            presence: Arc::new(PresenceRegistry::new(offline_grace)),
            rooms: RoomRegistry::new(),
        }
    }

    // ---- connection lifecycle (websocket handler only) ----

    pub async fn connect(&self, user: &UserId, handle: ConnectionHandle) -> ConnectOutcome {
        self.presence.connect(user, handle).await
    }

    /// Drop the connection from all rooms and from presence
    pub async fn disconnect(&self, connection: ConnectionId) -> DisconnectOutcome {
        let rooms_left = self.rooms.leave_all(connection).await;
        if rooms_left > 0 {
            tracing::debug!(connection = %connection, rooms_left, "left rooms on disconnect");
        }
        self.presence.disconnect(connection).await
    }

    pub async fn announce_offline(&self, user: &UserId) -> bool {
        self.presence.announce_offline(user).await
    }

    pub async fn join_room(&self, room: RoomKey, handle: &ConnectionHandle) -> bool {
        self.rooms.join(room, handle).await
    }

    pub async fn leave_room(&self, room: &RoomKey, connection: ConnectionId) -> bool {
        self.rooms.leave(room, connection).await
    }

    // ---- read side ----

    pub async fn is_online(&self, user: &UserId) -> bool {
        self.presence.is_online(user).await
    }

    pub async fn handle_for(&self, user: &UserId) -> Option<ConnectionHandle> {
        self.presence.handle_for(user).await
    }

    pub async fn is_handle_of_record(&self, user: &UserId, connection: ConnectionId) -> bool {
        self.presence.is_handle_of_record(user, connection).await
    }

    pub async fn online_users(&self) -> Vec<UserId> {
        self.presence.online_users().await
    }

    pub async fn is_room_member(&self, room: &RoomKey, connection: ConnectionId) -> bool {
        self.rooms.is_member(room, connection).await
    }

    // ---- emission ----

    /// Push `event` to `user`'s handle of record. Returns `false` if the user
    /// has no live handle.
    pub async fn emit_to_user(&self, user: &UserId, event: &ServerEvent) -> bool {
        match self.presence.handle_for(user).await {
            Some(handle) => handle.send(event),
            None => false,
        }
    }

    pub async fn emit_to_room(
        &self,
        room: &RoomKey,
        event: &ServerEvent,
        except: Option<ConnectionId>,
    ) -> usize {
        self.rooms.emit(room, event, except).await
    }

    pub async fn broadcast(&self, event: &ServerEvent) -> usize {
        self.presence.broadcast(event).await
    }
}
