//! Client-side conversation state.
//!
//! [`ChatSession`] folds server events into local state and answers with
//! [`Effects`]: events to send back and notices for the terminal. It owns no
//! transport so the whole reconciliation flow can be driven from tests.

use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use kizuna_server::infrastructure::dto::websocket::{
    ChatRoomPayload, ClientEvent, DeliveryAckPayload, MessageDto, MessageReadPayload,
    PresenceStatus, ServerEvent, UserOfflinePayload,
};
use kizuna_shared::time::now_millis;

use crate::{
    error::ClientError,
    reconcile::{DeliveryState, LedgerEntry, MessageLedger},
    typing::{TypingIndicators, TypingThrottle},
};

/// Something the terminal should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Incoming(LedgerEntry),
    DeliveryUpdated { id: String, state: DeliveryState },
    SendFailed { id: String, error: String },
    Presence { user_id: String, online: bool },
    OnlineUsers(Vec<String>),
    TypingStarted(String),
    TypingStopped(String),
    ServerError(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Effects {
    pub outgoing: Vec<ClientEvent>,
    pub notices: Vec<Notice>,
}

impl Effects {
    fn send(&mut self, event: ClientEvent) {
        self.outgoing.push(event);
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.notices.is_empty()
    }
}

pub struct ChatSession {
    me: String,
    active_peer: Option<String>,
    online: BTreeSet<String>,
    ledger: MessageLedger,
    throttle: TypingThrottle,
    indicators: TypingIndicators,
}

impl ChatSession {
    pub fn new(me: impl Into<String>, send_timeout: Duration) -> Self {
        let me = me.into();
        Self {
            ledger: MessageLedger::new(me.clone(), send_timeout),
            me,
            active_peer: None,
            online: BTreeSet::new(),
            throttle: TypingThrottle::default(),
            indicators: TypingIndicators::default(),
        }
    }

    pub fn me(&self) -> &str {
        &self.me
    }

    pub fn active_peer(&self) -> Option<&str> {
        self.active_peer.as_deref()
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.online.contains(user_id)
    }

    pub fn online_users(&self) -> Vec<String> {
        self.online.iter().cloned().collect()
    }

    pub fn is_typing(&self, peer: &str, now: Instant) -> bool {
        self.indicators.is_typing(peer, now)
    }

    pub fn ledger(&self) -> &MessageLedger {
        &self.ledger
    }

    /// Switch the active conversation, leaving the previous room.
    ///
    /// Unread messages already received from `peer` are acknowledged.
    pub fn open_chat(&mut self, peer: &str) -> Vec<ClientEvent> {
        let mut outgoing = self.close_chat();
        outgoing.push(ClientEvent::JoinChat(self.room_payload(peer)));
        outgoing.extend(self.acknowledge_unread(peer));
        self.active_peer = Some(peer.to_string());
        outgoing
    }

    pub fn close_chat(&mut self) -> Vec<ClientEvent> {
        let Some(peer) = self.active_peer.take() else {
            return Vec::new();
        };
        let mut outgoing = Vec::new();
        outgoing.extend(self.throttle.stop(&peer));
        outgoing.push(ClientEvent::LeaveChat(self.room_payload(&peer)));
        outgoing
    }

    /// Queue an optimistic message to the active peer.
    pub fn send(&mut self, content: &str, now: Instant) -> Result<Vec<ClientEvent>, ClientError> {
        let peer = self.active_peer.clone().ok_or(ClientError::NoActiveChat)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let mut outgoing = Vec::new();
        outgoing.extend(self.throttle.stop(&peer));
        outgoing.push(self.ledger.submit(&peer, content, now_millis(), now));
        Ok(outgoing)
    }

    /// Signal that the user is composing a message to the active peer.
    pub fn keystroke(&mut self, now: Instant) -> Option<ClientEvent> {
        let peer = self.active_peer.clone()?;
        self.throttle.keystroke(&peer, now)
    }

    pub fn mark_read(&self, message_id: &str) -> ClientEvent {
        ClientEvent::MessageRead(MessageReadPayload {
            message_id: message_id.to_string(),
        })
    }

    /// Explicit offline announcement sent before quitting
    pub fn go_offline(&self) -> ClientEvent {
        ClientEvent::UserOffline(UserOfflinePayload {
            user_id: self.me.clone(),
        })
    }

    /// Merge history fetched over HTTP. Returns how many messages were new.
    pub fn merge_history(&mut self, history: &[MessageDto]) -> usize {
        self.ledger.merge_history(history)
    }

    pub fn apply(&mut self, event: ServerEvent, now: Instant) -> Effects {
        let mut effects = Effects::default();
        match event {
            ServerEvent::UserStatus(payload) => {
                let online = payload.status == PresenceStatus::Online;
                if online {
                    self.online.insert(payload.user_id.clone());
                } else {
                    self.online.remove(&payload.user_id);
                    if self.indicators.on_stop(&payload.user_id) {
                        effects.notify(Notice::TypingStopped(payload.user_id.clone()));
                    }
                }
                effects.notify(Notice::Presence {
                    user_id: payload.user_id,
                    online,
                });
            }
            ServerEvent::OnlineUsers(payload) => {
                self.online = payload.users.into_iter().collect();
                effects.notify(Notice::OnlineUsers(self.online_users()));
            }
            ServerEvent::NewMessage(message) => {
                if !self.ledger.on_incoming(&message) {
                    return effects;
                }
                let from_peer = message.sender_id != self.me;
                if from_peer && self.active_peer.as_deref() == Some(message.sender_id.as_str()) {
                    if !message.read {
                        effects.send(self.mark_read(&message.id));
                    }
                    if self.indicators.on_stop(&message.sender_id) {
                        effects.notify(Notice::TypingStopped(message.sender_id.clone()));
                    }
                }
                if let Some(entry) = self.ledger.get(&message.id) {
                    effects.notify(Notice::Incoming(entry.clone()));
                }
            }
            ServerEvent::MessageDelivered(ack) => {
                self.confirm(&ack, DeliveryState::Delivered, &mut effects);
            }
            ServerEvent::MessageSent(ack) => {
                self.confirm(&ack, DeliveryState::Sent, &mut effects);
            }
            ServerEvent::MessageRead(payload) => {
                if self.ledger.on_read(&payload.message_id) {
                    effects.notify(Notice::DeliveryUpdated {
                        id: payload.message_id,
                        state: DeliveryState::Read,
                    });
                }
            }
            ServerEvent::UserTyping(payload) => {
                if self.indicators.on_typing(&payload.user_id, now) {
                    effects.notify(Notice::TypingStarted(payload.user_id));
                }
            }
            ServerEvent::StopTyping(payload) => {
                if self.indicators.on_stop(&payload.user_id) {
                    effects.notify(Notice::TypingStopped(payload.user_id));
                }
            }
            ServerEvent::MessageError(payload) => match payload.temp_id.clone() {
                Some(temp_id) if self.ledger.on_message_error(&payload) => {
                    effects.notify(Notice::SendFailed {
                        id: temp_id,
                        error: payload.error,
                    });
                }
                _ => effects.notify(Notice::ServerError(payload.error)),
            },
        }
        effects
    }

    /// Advance timers: send deadlines, typing windows and indicator decay.
    pub fn tick(&mut self, now: Instant) -> Effects {
        let mut effects = Effects::default();
        for temp_id in self.ledger.expire(now) {
            let error = self
                .ledger
                .get(&temp_id)
                .and_then(|entry| entry.error.clone())
                .unwrap_or_default();
            effects.notify(Notice::SendFailed { id: temp_id, error });
        }
        for event in self.throttle.expire(now) {
            effects.send(event);
        }
        for peer in self.indicators.expire(now) {
            effects.notify(Notice::TypingStopped(peer));
        }
        effects
    }

    fn confirm(
        &mut self,
        ack: &DeliveryAckPayload,
        outcome: DeliveryState,
        effects: &mut Effects,
    ) {
        if let Some(id) = self.ledger.confirm(ack, outcome)
            && let Some(entry) = self.ledger.get(&id)
        {
            effects.notify(Notice::DeliveryUpdated {
                id,
                state: entry.state,
            });
        }
    }

    fn acknowledge_unread(&self, peer: &str) -> Vec<ClientEvent> {
        self.ledger
            .timeline(peer)
            .into_iter()
            .filter(|entry| entry.sender_id == peer && entry.state != DeliveryState::Read)
            .map(|entry| self.mark_read(&entry.id))
            .collect()
    }

    fn room_payload(&self, peer: &str) -> ChatRoomPayload {
        ChatRoomPayload {
            user_id: self.me.clone(),
            other_user_id: peer.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kizuna_server::infrastructure::dto::websocket::{
        MessageErrorPayload, OnlineUsersPayload, PrivateMessagePayload,
        TypingPayload, TypingUserPayload, UserStatusPayload, UserSummaryDto,
    };

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn incoming(id: &str, from: &str, to: &str, read: bool) -> ServerEvent {
        let summary = |id: &str| UserSummaryDto {
            id: id.to_string(),
            name: id.to_string(),
            avatar: None,
        };
        ServerEvent::NewMessage(MessageDto {
            id: id.to_string(),
            content: "hello".to_string(),
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            created_at: 1_700_000_000_000,
            read,
            sender: summary(from),
            receiver: summary(to),
        })
    }

    fn status(user: &str, status: PresenceStatus) -> ServerEvent {
        ServerEvent::UserStatus(UserStatusPayload {
            user_id: user.to_string(),
            status,
        })
    }

    fn read(id: &str) -> ClientEvent {
        ClientEvent::MessageRead(MessageReadPayload {
            message_id: id.to_string(),
        })
    }

    fn temp_id_of(events: &[ClientEvent]) -> String {
        events
            .iter()
            .find_map(|event| match event {
                ClientEvent::PrivateMessage(PrivateMessagePayload { temp_id, .. }) => {
                    temp_id.clone()
                }
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_open_chat_switches_rooms() {
        // テスト項目: 会話を切り替えると前のルームから退出し新しいルームに参加する
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        session.open_chat("bob");

        // when (操作):
        let outgoing = session.open_chat("carol");

        // then (期待する結果):
        let room = |other: &str| ChatRoomPayload {
            user_id: "alice".to_string(),
            other_user_id: other.to_string(),
        };
        assert_eq!(
            outgoing,
            vec![
                ClientEvent::LeaveChat(room("bob")),
                ClientEvent::JoinChat(room("carol")),
            ]
        );
        assert_eq!(session.active_peer(), Some("carol"));
    }

    #[test]
    fn test_send_requires_active_chat() {
        // テスト項目: 会話を開いていない状態や空文字では送信できない
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);

        // when (操作):
        let without_chat = session.send("hi", Instant::now());
        session.open_chat("bob");
        let empty = session.send("   ", Instant::now());

        // then (期待する結果):
        assert!(matches!(without_chat, Err(ClientError::NoActiveChat)));
        assert!(matches!(empty, Err(ClientError::EmptyMessage)));
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn test_send_stops_typing_first() {
        // テスト項目: 入力中の状態で送信すると stopTyping の後にメッセージが送られる
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        session.open_chat("bob");
        let now = Instant::now();
        session.keystroke(now);

        // when (操作):
        let outgoing = session.send("hi", now).unwrap();

        // then (期待する結果):
        assert_eq!(outgoing.len(), 2);
        assert_eq!(
            outgoing[0],
            ClientEvent::StopTyping(TypingPayload {
                receiver_id: "bob".to_string()
            })
        );
        assert!(matches!(outgoing[1], ClientEvent::PrivateMessage(_)));
    }

    #[test]
    fn test_full_send_reconciliation() {
        // テスト項目: 送信→配達確認→既読で状態が順に進む
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        session.open_chat("bob");
        let now = Instant::now();
        let temp_id = temp_id_of(&session.send("hi", now).unwrap());

        // when (操作):
        let delivered = session.apply(
            ServerEvent::MessageDelivered(DeliveryAckPayload {
                message_id: "m1".to_string(),
                temp_id: Some(temp_id),
            }),
            now,
        );
        let echoed = session.apply(incoming("m1", "alice", "bob", false), now);
        let read = session.apply(
            ServerEvent::MessageRead(MessageReadPayload {
                message_id: "m1".to_string(),
            }),
            now,
        );

        // then (期待する結果):
        assert_eq!(
            delivered.notices,
            vec![Notice::DeliveryUpdated {
                id: "m1".to_string(),
                state: DeliveryState::Delivered
            }]
        );
        assert!(echoed.is_empty());
        assert_eq!(
            read.notices,
            vec![Notice::DeliveryUpdated {
                id: "m1".to_string(),
                state: DeliveryState::Read
            }]
        );
        assert_eq!(session.ledger().len(), 1);
    }

    #[test]
    fn test_incoming_from_active_peer_is_marked_read() {
        // テスト項目: 開いている会話の相手からのメッセージには自動で既読を返す
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        session.open_chat("bob");
        let now = Instant::now();

        // when (操作):
        let from_bob = session.apply(incoming("m1", "bob", "alice", false), now);
        let from_carol = session.apply(incoming("m2", "carol", "alice", false), now);

        // then (期待する結果):
        assert_eq!(from_bob.outgoing, vec![read("m1")]);
        assert!(matches!(from_bob.notices[..], [Notice::Incoming(_)]));
        assert!(from_carol.outgoing.is_empty());
    }

    #[test]
    fn test_opening_chat_acknowledges_unread() {
        // テスト項目: 会話を開くと受信済みの未読メッセージに既読を返す
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        let now = Instant::now();
        session.apply(incoming("m1", "bob", "alice", false), now);
        session.apply(incoming("m2", "bob", "alice", true), now);

        // when (操作):
        let outgoing = session.open_chat("bob");

        // then (期待する結果):
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[1], read("m1"));
    }

    #[test]
    fn test_send_times_out() {
        // テスト項目: 確認応答が無いまま期限を過ぎると送信失敗が通知される
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        session.open_chat("bob");
        let start = Instant::now();
        let temp_id = temp_id_of(&session.send("hi", start).unwrap());

        // when (操作):
        let effects = session.tick(start + TIMEOUT);

        // then (期待する結果):
        assert!(matches!(
            &effects.notices[..],
            [Notice::SendFailed { id, .. }] if *id == temp_id
        ));
        assert_eq!(
            session.ledger().get(&temp_id).unwrap().state,
            DeliveryState::Error
        );
    }

    #[test]
    fn test_message_error_without_temp_id() {
        // テスト項目: tempId の無いエラーはサーバーエラーとして通知される
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);

        // when (操作):
        let effects = session.apply(
            ServerEvent::MessageError(MessageErrorPayload {
                error: "Unauthorized".to_string(),
                temp_id: None,
            }),
            Instant::now(),
        );

        // then (期待する結果):
        assert_eq!(
            effects.notices,
            vec![Notice::ServerError("Unauthorized".to_string())]
        );
    }

    #[test]
    fn test_presence_tracking() {
        // テスト項目: オンライン一覧と状態変化でオンライン集合が更新される
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        let now = Instant::now();
        session.apply(
            ServerEvent::OnlineUsers(OnlineUsersPayload {
                users: vec!["bob".to_string(), "carol".to_string()],
            }),
            now,
        );

        // when (操作):
        session.apply(status("bob", PresenceStatus::Offline), now);
        session.apply(status("dave", PresenceStatus::Online), now);

        // then (期待する結果):
        assert_eq!(session.online_users(), vec!["carol", "dave"]);
        assert!(!session.is_online("bob"));
    }

    #[test]
    fn test_typing_indicator_lifecycle() {
        // テスト項目: userTyping で表示され、3 秒経過で自動的に消える
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        let start = Instant::now();
        let typing = ServerEvent::UserTyping(TypingUserPayload {
            user_id: "bob".to_string(),
        });

        // when (操作):
        let started = session.apply(typing, start);
        let decayed = session.tick(start + Duration::from_secs(3));

        // then (期待する結果):
        assert_eq!(started.notices, vec![Notice::TypingStarted("bob".to_string())]);
        assert_eq!(decayed.notices, vec![Notice::TypingStopped("bob".to_string())]);
        assert!(!session.is_typing("bob", start + Duration::from_secs(3)));
    }

    #[test]
    fn test_keystroke_throttled_then_stopped() {
        // テスト項目: 入力通知は間引かれ、2 秒後に stopTyping が送られる
        // given (前提条件):
        let mut session = ChatSession::new("alice", TIMEOUT);
        session.open_chat("bob");
        let start = Instant::now();

        // when (操作):
        let first = session.keystroke(start);
        let second = session.keystroke(start + Duration::from_millis(100));
        let effects = session.tick(start + Duration::from_secs(2));

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(
            effects.outgoing,
            vec![ClientEvent::StopTyping(TypingPayload {
                receiver_id: "bob".to_string()
            })]
        );
    }
}
