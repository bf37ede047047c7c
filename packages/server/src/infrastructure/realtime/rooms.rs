//! Conversation room membership.
//!
//! A room is a broadcast group of connections keyed by [`RoomKey`]. Rooms are
//! created on first join and dropped when their last member leaves.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{domain::RoomKey, infrastructure::dto::websocket::ServerEvent};

use super::connection::{ConnectionHandle, ConnectionId, encode};

#[derive(Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomKey, HashMap<ConnectionId, ConnectionHandle>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handle` to `room`. Returns `false` if it was already a member.
    pub async fn join(&self, room: RoomKey, handle: &ConnectionHandle) -> bool {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room)
            .or_default()
            .insert(handle.id(), handle.clone())
            .is_none()
    }

    /// Remove `connection` from `room`. Leaving as a non-member is a no-op
    /// returning `false`.
    pub async fn leave(&self, room: &RoomKey, connection: ConnectionId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(members) = rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(&connection).is_some();
        if members.is_empty() {
            rooms.remove(room);
        }
        removed
    }

    /// Remove `connection` from every room. Returns how many rooms it left.
    pub async fn leave_all(&self, connection: ConnectionId) -> usize {
        let mut rooms = self.rooms.lock().await;
        let mut left = 0;
        rooms.retain(|_, members| {
            if members.remove(&connection).is_some() {
                left += 1;
            }
            !members.is_empty()
        });
        left
    }

    pub async fn is_member(&self, room: &RoomKey, connection: ConnectionId) -> bool {
        self.rooms
            .lock()
            .await
            .get(room)
            .is_some_and(|members| members.contains_key(&connection))
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Send `event` to every member of `room` except `except`. Returns the
    /// number of connections reached.
    pub async fn emit(
        &self,
        room: &RoomKey,
        event: &ServerEvent,
        except: Option<ConnectionId>,
    ) -> usize {
        let targets: Vec<ConnectionHandle> = {
            let rooms = self.rooms.lock().await;
            match rooms.get(room) {
                Some(members) => members
                    .values()
                    .filter(|handle| Some(handle.id()) != except)
                    .cloned()
                    .collect(),
                None => return 0,
            }
        };

        let Some(frame) = encode(event) else {
            return 0;
        };
        targets
            .iter()
            .filter(|handle| handle.send_raw(frame.clone()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::UserId,
        infrastructure::dto::websocket::{ServerEvent, TypingUserPayload},
    };
    use tokio::sync::mpsc;

    fn room(a: &str, b: &str) -> RoomKey {
        RoomKey::for_pair(
            &UserId::new(a.to_string()).unwrap(),
            &UserId::new(b.to_string()).unwrap(),
        )
    }

    fn connection() -> (ConnectionHandle, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(tx), rx)
    }

    fn typing() -> ServerEvent {
        ServerEvent::UserTyping(TypingUserPayload {
            user_id: "u1".to_string(),
        })
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        // テスト項目: 同じ接続が二度参加してもメンバーは一つ
        // given (前提条件):
        let rooms = RoomRegistry::new();
        let (handle, _rx) = connection();

        // when (操作):
        let first = rooms.join(room("u1", "u2"), &handle).await;
        let second = rooms.join(room("u2", "u1"), &handle).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(rooms.room_count().await, 1);
        assert!(rooms.is_member(&room("u1", "u2"), handle.id()).await);
    }

    #[tokio::test]
    async fn test_leave_non_member_is_noop() {
        // テスト項目: メンバーでない接続の退出は何もしない
        // given (前提条件):
        let rooms = RoomRegistry::new();
        let (member, _rx1) = connection();
        let (stranger, _rx2) = connection();
        rooms.join(room("u1", "u2"), &member).await;

        // when (操作):
        let left = rooms.leave(&room("u1", "u2"), stranger.id()).await;
        let left_unknown_room = rooms.leave(&room("u8", "u9"), member.id()).await;

        // then (期待する結果):
        assert!(!left);
        assert!(!left_unknown_room);
        assert!(rooms.is_member(&room("u1", "u2"), member.id()).await);
    }

    #[tokio::test]
    async fn test_empty_room_is_dropped() {
        // テスト項目: 最後のメンバーが退出するとルームは削除される
        // given (前提条件):
        let rooms = RoomRegistry::new();
        let (handle, _rx) = connection();
        rooms.join(room("u1", "u2"), &handle).await;

        // when (操作):
        let left = rooms.leave(&room("u1", "u2"), handle.id()).await;

        // then (期待する結果):
        assert!(left);
        assert_eq!(rooms.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_leave_all() {
        // テスト項目: 切断時に全ルームから退出できる
        // given (前提条件):
        let rooms = RoomRegistry::new();
        let (handle, _rx) = connection();
        let (other, _rx2) = connection();
        rooms.join(room("u1", "u2"), &handle).await;
        rooms.join(room("u1", "u3"), &handle).await;
        rooms.join(room("u1", "u3"), &other).await;

        // when (操作):
        let left = rooms.leave_all(handle.id()).await;

        // then (期待する結果):
        assert_eq!(left, 2);
        assert_eq!(rooms.room_count().await, 1);
        assert!(rooms.is_member(&room("u1", "u3"), other.id()).await);
    }

    #[tokio::test]
    async fn test_emit_skips_excluded_connection() {
        // テスト項目: ルーム配信は除外指定した接続以外の全メンバーに届く
        // given (前提条件):
        let rooms = RoomRegistry::new();
        let (sender, mut sender_rx) = connection();
        let (receiver, mut receiver_rx) = connection();
        rooms.join(room("u1", "u2"), &sender).await;
        rooms.join(room("u1", "u2"), &receiver).await;

        // when (操作):
        let reached = rooms
            .emit(&room("u1", "u2"), &typing(), Some(sender.id()))
            .await;

        // then (期待する結果):
        assert_eq!(reached, 1);
        assert!(receiver_rx.try_recv().is_ok());
        assert!(sender_rx.try_recv().is_err());
    }
}
