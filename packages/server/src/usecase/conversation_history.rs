//! UseCase: 会話履歴の取得
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - GetConversationHistoryUseCase::execute() メソッド
//! - 履歴の取得と、相手から届いた未読メッセージの一括既読
//!
//! ### なぜこのテストが必要か
//! - 履歴が古い順に返ることを保証
//! - 一括既読で相手へ messageRead が通知されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：未読を含む履歴の取得
//! - エッジケース：やりとりの無い相手、自分が送った未読メッセージ

use std::sync::Arc;

use crate::{
    domain::{MessageRepository, MessageWithParticipants, UserId, UserRepository},
    infrastructure::{
        dto::websocket::{MessageReadPayload, ServerEvent},
        realtime::ConnectionHub,
    },
};

use super::{error::HistoryError, participants::ParticipantDirectory};

/// 会話履歴取得のユースケース
pub struct GetConversationHistoryUseCase {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    hub: Arc<ConnectionHub>,
}

impl GetConversationHistoryUseCase {
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

    /// `viewer` と `peer_id` の間の全メッセージを古い順に返す
    ///
    /// 相手から届いた未読メッセージは既読になり、相手の接続へ messageRead が
    /// 通知されます。返す履歴は既読化する前の状態です。
    pub async fn execute(
        &self,
        viewer: &UserId,
        peer_id: &str,
    ) -> Result<Vec<MessageWithParticipants>, HistoryError> {
        let peer = UserId::new(peer_id.to_string())
            .map_err(|e| HistoryError::Validation(e.to_string()))?;

        let messages = self
            .messages
            .find_between(viewer, &peer)
            .await
            .map_err(|e| HistoryError::Persistence(e.to_string()))?;

        let marked = self
            .messages
            .mark_conversation_read(viewer, &peer)
            .await
            .map_err(|e| HistoryError::Persistence(e.to_string()))?;
        for id in &marked {
            self.hub
                .emit_to_user(
                    &peer,
                    &ServerEvent::MessageRead(MessageReadPayload {
                        message_id: id.to_string(),
                    }),
                )
                .await;
        }
        tracing::debug!(
            user_id = %viewer,
            peer_id = %peer,
            messages = messages.len(),
            marked_read = marked.len(),
            "conversation history loaded"
        );

        let mut directory = ParticipantDirectory::new(self.users.as_ref());
        let mut history = Vec::with_capacity(messages.len());
        for message in messages {
            history.push(
                directory
                    .attach(message)
                    .await
                    .map_err(|e| HistoryError::Persistence(e.to_string()))?,
            );
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessageContent, NewMessage},
        usecase::test_support::{Fixture, user},
    };

    async fn send(fixture: &Fixture, from: &str, to: &str, content: &str) {
        fixture
            .messages
            .create(NewMessage {
                sender_id: user(from),
                receiver_id: user(to),
                content: MessageContent::new(content.to_string()).unwrap(),
            })
            .await
            .unwrap();
    }

    fn create_usecase(fixture: &Fixture) -> GetConversationHistoryUseCase {
        GetConversationHistoryUseCase::new(
            fixture.messages.clone(),
            fixture.users.clone(),
            fixture.hub.clone(),
        )
    }

    #[tokio::test]
    async fn test_history_is_oldest_first_with_participants() {
        // テスト項目: 二人の間のメッセージだけが古い順に、参加者情報付きで返される
        // given (前提条件):
        let fixture = Fixture::new();
        send(&fixture, "alice", "bob", "first").await;
        send(&fixture, "bob", "alice", "second").await;
        send(&fixture, "alice", "carol", "elsewhere").await;
        let usecase = create_usecase(&fixture);

        // when (操作):
        let history = usecase.execute(&user("alice"), "bob").await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = history
            .iter()
            .map(|m| m.message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(history[0].sender.name, "Alice");
        assert_eq!(history[0].receiver.name, "Bob");
    }

    #[tokio::test]
    async fn test_history_marks_incoming_messages_read() {
        // テスト項目: 相手から届いた未読が既読になり、相手へ messageRead が通知される
        // given (前提条件):
        let fixture = Fixture::new();
        send(&fixture, "bob", "alice", "ping").await;
        send(&fixture, "alice", "bob", "pong").await;
        let usecase = create_usecase(&fixture);
        let (_bob, mut bob_inbox) = fixture.connect("bob").await;

        // when (操作):
        let history = usecase.execute(&user("alice"), "bob").await.unwrap();

        // then (期待する結果): 返る履歴は既読化前の状態
        assert!(!history[0].message.is_read());
        assert_eq!(
            bob_inbox.drain(),
            vec![ServerEvent::MessageRead(MessageReadPayload {
                message_id: history[0].message.id.to_string(),
            })]
        );
        let after = fixture
            .messages
            .find_between(&user("alice"), &user("bob"))
            .await
            .unwrap();
        assert!(after[0].is_read());
        // 自分が送ったメッセージは既読にならない
        assert!(!after[1].is_read());
    }

    #[tokio::test]
    async fn test_history_with_stranger_is_empty() {
        // テスト項目: やりとりの無い相手との履歴は空
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = create_usecase(&fixture);

        // when (操作):
        let history = usecase.execute(&user("alice"), "carol").await;
        let invalid = usecase.execute(&user("alice"), "").await;

        // then (期待する結果):
        assert!(history.unwrap().is_empty());
        assert!(matches!(invalid, Err(HistoryError::Validation(_))));
    }
}
