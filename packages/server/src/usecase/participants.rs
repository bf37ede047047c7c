//! 参加者プロフィールの非正規化ヘルパー
//!
//! 送出するメッセージには送信者・受信者の表示属性を埋め込みます。
//! プロフィールが削除済みのユーザーは `UserSummary::unknown` で補います。

use std::collections::HashMap;

use crate::domain::{
    Message, MessageWithParticipants, RepositoryError, UserId, UserRepository, UserSummary,
};

/// 1 リクエスト内でプロフィール参照を使い回すキャッシュ
pub(crate) struct ParticipantDirectory<'a> {
    users: &'a dyn UserRepository,
    cache: HashMap<UserId, UserSummary>,
}

impl<'a> ParticipantDirectory<'a> {
    pub(crate) fn new(users: &'a dyn UserRepository) -> Self {
        Self {
            users,
            cache: HashMap::new(),
        }
    }

    pub(crate) async fn summary_of(&mut self, id: &UserId) -> Result<UserSummary, RepositoryError> {
        if let Some(summary) = self.cache.get(id) {
            return Ok(summary.clone());
        }
        let summary = match self.users.find_by_id(id).await? {
            Some(profile) => profile.summary(),
            None => UserSummary::unknown(id.clone()),
        };
        self.cache.insert(id.clone(), summary.clone());
        Ok(summary)
    }

    pub(crate) async fn attach(
        &mut self,
        message: Message,
    ) -> Result<MessageWithParticipants, RepositoryError> {
        let sender = self.summary_of(&message.sender_id).await?;
        let receiver = self.summary_of(&message.receiver_id).await?;
        Ok(MessageWithParticipants {
            message,
            sender,
            receiver,
        })
    }
}
