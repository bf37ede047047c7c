//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendPrivateMessageUseCase::execute() メソッド
//! - 検証 → 永続化 → ルーム配信 → 受信者への直接配信 → 送信元への確認応答 → 送信者へのエコー
//!
//! ### なぜこのテストが必要か
//! - 受信者の在席状況で messageDelivered / messageSent が切り替わることを保証
//! - 失敗時に送信元へ tempId 付きの messageError が返ることを確認
//! - 永続化に失敗したメッセージが配信されないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：受信者オンライン / オフライン
//! - 異常系：空のメッセージ、存在しない受信者、永続化失敗
//! - エッジケース：HTTP 経由の送信（送信元の接続なし）

use std::sync::Arc;

use crate::{
    domain::{
        MessageContent, MessageRepository, MessageWithParticipants, NewMessage, RoomKey, UserId,
        UserRepository,
    },
    infrastructure::{
        dto::websocket::{DeliveryAckPayload, MessageDto, MessageErrorPayload, ServerEvent},
        realtime::{ConnectionHandle, ConnectionHub},
    },
};

use super::{error::SendMessageError, participants::ParticipantDirectory};

/// 送信要求
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub sender_id: UserId,
    pub receiver_id: String,
    pub content: String,
    /// クライアントが楽観的表示に使う一時 ID
    pub temp_id: Option<String>,
}

/// 送信元への確認応答の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 受信者の接続へ配信済み
    Delivered,
    /// 保存済み、受信者はオフライン
    Sent,
}

#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub message: MessageWithParticipants,
    pub outcome: DeliveryOutcome,
}

/// 1 対 1 メッセージ送信のユースケース
pub struct SendPrivateMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    hub: Arc<ConnectionHub>,
}

impl SendPrivateMessageUseCase {
    /// 新しい SendPrivateMessageUseCase を作成
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        hub: Arc<ConnectionHub>,
    ) -> Self {
        Self {
            messages,
            users,
            hub,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `command` - 送信要求
    /// * `origin` - 送信元の接続。HTTP 経由の送信では `None`
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryReport)` - 保存済みメッセージと確認応答の種類
    /// * `Err(SendMessageError)` - 送信失敗。`origin` には messageError が送られる
    pub async fn execute(
        &self,
        command: SendMessageCommand,
        origin: Option<&ConnectionHandle>,
    ) -> Result<DeliveryReport, SendMessageError> {
        let temp_id = command.temp_id.clone();
        match self.deliver(command, origin).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::warn!(error = %e, "message not sent");
                if let Some(origin) = origin {
                    origin.send(&ServerEvent::MessageError(MessageErrorPayload {
                        error: e.client_message().to_string(),
                        temp_id,
                    }));
                }
                Err(e)
            }
        }
    }

    async fn deliver(
        &self,
        command: SendMessageCommand,
        origin: Option<&ConnectionHandle>,
    ) -> Result<DeliveryReport, SendMessageError> {
        // 1. 検証
        let content = MessageContent::new(command.content)
            .map_err(|e| SendMessageError::Validation(e.to_string()))?;
        let receiver_id = UserId::new(command.receiver_id)
            .map_err(|e| SendMessageError::Validation(e.to_string()))?;
        let sender_id = command.sender_id;

        let receiver = self
            .users
            .find_by_id(&receiver_id)
            .await
            .map_err(|e| SendMessageError::Persistence(e.to_string()))?
            .ok_or_else(|| SendMessageError::ReceiverNotFound(receiver_id.to_string()))?;
        let sender = ParticipantDirectory::new(self.users.as_ref())
            .summary_of(&sender_id)
            .await
            .map_err(|e| SendMessageError::Persistence(e.to_string()))?;

        // 2. 永続化（失敗したメッセージは配信しない）
        let message = self
            .messages
            .create(NewMessage {
                sender_id: sender_id.clone(),
                receiver_id: receiver_id.clone(),
                content,
            })
            .await
            .map_err(|e| {
                tracing::error!(sender_id = %sender_id, error = %e, "failed to persist message");
                SendMessageError::Persistence(e.to_string())
            })?;

        let view = MessageWithParticipants {
            message,
            sender,
            receiver: receiver.summary(),
        };
        let event = ServerEvent::NewMessage(MessageDto::from(&view));

        // 3. 会話ルームへの配信（送信元の接続も含む）
        let room = RoomKey::for_pair(&sender_id, &receiver_id);
        let room_recipients = self.hub.emit_to_room(&room, &event, None).await;

        // 4. 受信者の現在のハンドルへ直接配信
        let delivered = match self.hub.handle_for(&receiver_id).await {
            Some(handle) => handle.send(&event),
            None => false,
        };
        let outcome = if delivered {
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::Sent
        };

        // 5. 送信元への確認応答
        if let Some(origin) = origin {
            let ack = DeliveryAckPayload {
                message_id: view.message.id.to_string(),
                temp_id: command.temp_id,
            };
            origin.send(&match outcome {
                DeliveryOutcome::Delivered => ServerEvent::MessageDelivered(ack),
                DeliveryOutcome::Sent => ServerEvent::MessageSent(ack),
            });
        }

        // 6. 送信者へのエコー（現在のハンドル、無ければ送信元）
        if !self.hub.emit_to_user(&sender_id, &event).await
            && let Some(origin) = origin
        {
            origin.send(&event);
        }

        tracing::info!(
            message_id = %view.message.id,
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            room_recipients,
            ?outcome,
            "message sent"
        );

        Ok(DeliveryReport {
            message: view,
            outcome,
        })
    }
}
