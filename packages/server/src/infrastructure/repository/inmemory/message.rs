//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! 追記専用の Vec をメッセージログとして使用します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Message, MessageId, MessageIdFactory, MessageRepository, NewMessage, RepositoryError,
    Timestamp, UserId,
};

pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Default)]
struct MessageLog {
    /// 追記順 = created_at 順
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
    last_created_at: Option<Timestamp>,
}

/// インメモリ Message Repository 実装
pub struct InMemoryMessageRepository {
    log: Mutex<MessageLog>,
    clock: Clock,
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageRepository {
    /// 壁時計（UTC ミリ秒）を使う Repository を作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(kizuna_shared::time::now_millis))
    }

    /// 任意の時計を使う Repository を作成（テスト用）
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            log: Mutex::new(MessageLog::default()),
            clock,
        }
    }

    /// 保存済みメッセージ数
    pub async fn count(&self) -> usize {
        self.log.lock().await.messages.len()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, new_message: NewMessage) -> Result<Message, RepositoryError> {
        let id = MessageIdFactory::generate()
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;

        let mut log = self.log.lock().await;

        // 壁時計が巻き戻っても created_at は単調非減少
        let now = Timestamp::new((self.clock)());
        let created_at = match log.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };

        let message = Message::new(
            id.clone(),
            new_message.content,
            new_message.sender_id,
            new_message.receiver_id,
            created_at,
            false,
        );

        let position = log.messages.len();
        log.messages.push(message.clone());
        log.index.insert(id, position);
        log.last_created_at = Some(created_at);

        Ok(message)
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let log = self.log.lock().await;
        Ok(log.index.get(id).map(|&i| log.messages[i].clone()))
    }

    async fn mark_as_read(&self, id: &MessageId) -> Result<(), RepositoryError> {
        let mut log = self.log.lock().await;
        let position = *log
            .index
            .get(id)
            .ok_or_else(|| RepositoryError::MessageNotFound(id.to_string()))?;

        let message = &mut log.messages[position];
        let receiver = message.receiver_id.clone();
        message
            .mark_read(&receiver)
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn find_between(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, RepositoryError> {
        let log = self.log.lock().await;
        Ok(log
            .messages
            .iter()
            .filter(|m| {
                (&m.sender_id == a && &m.receiver_id == b)
                    || (&m.sender_id == b && &m.receiver_id == a)
            })
            .cloned()
            .collect())
    }

    async fn find_involving(&self, user: &UserId) -> Result<Vec<Message>, RepositoryError> {
        let log = self.log.lock().await;
        Ok(log
            .messages
            .iter()
            .rev()
            .filter(|m| m.involves(user))
            .cloned()
            .collect())
    }

    async fn mark_conversation_read(
        &self,
        receiver: &UserId,
        sender: &UserId,
    ) -> Result<Vec<MessageId>, RepositoryError> {
        let mut log = self.log.lock().await;
        let mut changed = Vec::new();
        for message in log
            .messages
            .iter_mut()
            .filter(|m| &m.receiver_id == receiver && &m.sender_id == sender)
        {
            if message
                .mark_read(receiver)
                .map_err(|e| RepositoryError::Unavailable(e.to_string()))?
            {
                changed.push(message.id.clone());
            }
        }
        Ok(changed)
    }
}
