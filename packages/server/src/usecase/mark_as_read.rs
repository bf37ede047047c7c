//! UseCase: 既読処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - MarkAsReadUseCase::execute() メソッド
//! - 既読フラグの永続化と送信者への messageRead 通知
//!
//! ### なぜこのテストが必要か
//! - 受信者以外が既読にできないことを保証
//! - 既読済みメッセージで送信者へ再通知しないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：受信者による既読
//! - 異常系：存在しないメッセージ、受信者以外による既読
//! - エッジケース：既読済みメッセージ、送信者がオフライン

use std::sync::Arc;

use crate::{
    domain::{MessageError, MessageId, MessageRepository, UserId},
    infrastructure::{
        dto::websocket::{MessageErrorPayload, MessageReadPayload, ServerEvent},
        realtime::{ConnectionHandle, ConnectionHub},
    },
};

use super::error::MarkAsReadError;

/// 既読処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadReceipt {
    /// 未読から既読になった。送信者の接続へ通知できたかを保持する
    Marked { sender_notified: bool },
    /// 既に既読だった
    AlreadyRead,
}

/// 既読処理のユースケース
pub struct MarkAsReadUseCase {
    messages: Arc<dyn MessageRepository>,
    hub: Arc<ConnectionHub>,
}

impl MarkAsReadUseCase {
    /// 新しい MarkAsReadUseCase を作成
    pub fn new(messages: Arc<dyn MessageRepository>, hub: Arc<ConnectionHub>) -> Self {
        Self { messages, hub }
    }

    /// 既読処理を実行
    ///
    /// # Arguments
    ///
    /// * `actor` - 既読にするユーザー（メッセージの受信者である必要がある）
    /// * `message_id` - 対象メッセージの ID
    /// * `origin` - 要求元の接続。失敗時に messageError が送られる
    pub async fn execute(
        &self,
        actor: &UserId,
        message_id: &str,
        origin: Option<&ConnectionHandle>,
    ) -> Result<ReadReceipt, MarkAsReadError> {
        match self.mark(actor, message_id).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                tracing::warn!(user_id = %actor, message_id, error = %e, "mark as read rejected");
                if let Some(origin) = origin {
                    origin.send(&ServerEvent::MessageError(MessageErrorPayload {
                        error: e.client_message().to_string(),
                        temp_id: None,
                    }));
                }
                Err(e)
            }
        }
    }

    async fn mark(&self, actor: &UserId, message_id: &str) -> Result<ReadReceipt, MarkAsReadError> {
        let id = MessageId::new(message_id.to_string())
            .map_err(|e| MarkAsReadError::Validation(e.to_string()))?;

        let mut message = self
            .messages
            .find_by_id(&id)
            .await
            .map_err(|e| MarkAsReadError::Persistence(e.to_string()))?
            .ok_or_else(|| MarkAsReadError::NotFound(id.to_string()))?;

        let changed = message.mark_read(actor).map_err(|e| match e {
            MessageError::NotReceiver { actor, message_id } => {
                MarkAsReadError::Unauthorized { actor, message_id }
            }
        })?;
        if !changed {
            return Ok(ReadReceipt::AlreadyRead);
        }

        self.messages
            .mark_as_read(&id)
            .await
            .map_err(|e| MarkAsReadError::Persistence(e.to_string()))?;

        let event = ServerEvent::MessageRead(MessageReadPayload {
            message_id: id.to_string(),
        });
        let sender_notified = self.hub.emit_to_user(&message.sender_id, &event).await;
        tracing::debug!(message_id = %id, reader = %actor, sender_notified, "message read");

        Ok(ReadReceipt::Marked { sender_notified })
    }
}
