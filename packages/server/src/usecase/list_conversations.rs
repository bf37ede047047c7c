//! UseCase: 会話一覧の取得

use std::{collections::HashMap, sync::Arc};

use crate::domain::{
    ConversationSummary, MessageRepository, UserId, UserRepository, UserSummary,
    summarize_conversations,
};

use super::{error::HistoryError, participants::ParticipantDirectory};

/// 会話一覧取得のユースケース
pub struct ListConversationsUseCase {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
}

impl ListConversationsUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { messages, users }
    }

    /// 会話相手ごとに最新メッセージと未読数をまとめ、新しい順に返す
    pub async fn execute(&self, viewer: &UserId) -> Result<Vec<ConversationSummary>, HistoryError> {
        let messages = self
            .messages
            .find_involving(viewer)
            .await
            .map_err(|e| HistoryError::Persistence(e.to_string()))?;

        let mut directory = ParticipantDirectory::new(self.users.as_ref());
        let mut peers: HashMap<UserId, UserSummary> = HashMap::new();
        for message in &messages {
            let peer = message.peer_of(viewer);
            if !peers.contains_key(peer) {
                let summary = directory
                    .summary_of(peer)
                    .await
                    .map_err(|e| HistoryError::Persistence(e.to_string()))?;
                peers.insert(peer.clone(), summary);
            }
        }

        Ok(summarize_conversations(viewer, &messages, |peer| {
            peers
                .get(peer)
                .cloned()
                .unwrap_or_else(|| UserSummary::unknown(peer.clone()))
        }))
    }
}
