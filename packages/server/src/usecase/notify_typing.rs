//! UseCase: 入力中通知の中継
//!
//! サーバーは入力中状態を保持しません。通知は会話ルームの他の接続と
//! 受信者の現在のハンドルへそのまま中継されます。

use std::sync::Arc;

use crate::{
    domain::{RoomKey, UserId, ValueObjectError},
    infrastructure::{
        dto::websocket::{ServerEvent, TypingUserPayload},
        realtime::{ConnectionHub, ConnectionId},
    },
};

/// 入力中通知の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Started,
    Stopped,
}

/// 入力中通知中継のユースケース
pub struct NotifyTypingUseCase {
    hub: Arc<ConnectionHub>,
}

impl NotifyTypingUseCase {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }

    /// 通知を中継し、届いた接続数を返す
    ///
    /// 送信元の接続 `origin` にはルーム経由で送り返しません。
    pub async fn execute(
        &self,
        sender: &UserId,
        receiver_id: &str,
        signal: TypingSignal,
        origin: Option<ConnectionId>,
    ) -> Result<usize, ValueObjectError> {
        let receiver = UserId::new(receiver_id.to_string())?;
        let payload = TypingUserPayload {
            user_id: sender.to_string(),
        };
        let event = match signal {
            TypingSignal::Started => ServerEvent::UserTyping(payload),
            TypingSignal::Stopped => ServerEvent::StopTyping(payload),
        };

        let room = RoomKey::for_pair(sender, &receiver);
        let mut reached = self.hub.emit_to_room(&room, &event, origin).await;
        if self.hub.emit_to_user(&receiver, &event).await {
            reached += 1;
        }
        tracing::trace!(sender_id = %sender, receiver_id = %receiver, ?signal, reached, "typing relayed");
        Ok(reached)
    }
}
