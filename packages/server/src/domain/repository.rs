//! Repository ports.
//!
//! The UseCase layer depends on these traits; the infrastructure layer
//! provides the implementations (dependency inversion).

use async_trait::async_trait;

use super::{
    entity::{Message, NewMessage, UserProfile},
    error::RepositoryError,
    value_object::{MessageId, UserId},
};

/// Durable message log with a read flag per message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new unread message, assigning its id and `created_at`.
    ///
    /// `created_at` never decreases between consecutive calls.
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError>;

    /// Set the read flag. Setting it on an already-read message is not an error.
    async fn mark_as_read(&self, id: &MessageId) -> Result<(), RepositoryError>;

    /// All messages exchanged between `a` and `b`, oldest first.
    async fn find_between(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, RepositoryError>;

    /// All messages sent or received by `user`, newest first.
    async fn find_involving(&self, user: &UserId) -> Result<Vec<Message>, RepositoryError>;

    /// Mark every unread message from `sender` to `receiver` as read and
    /// return the ids that changed.
    async fn mark_conversation_read(
        &self,
        receiver: &UserId,
        sender: &UserId,
    ) -> Result<Vec<MessageId>, RepositoryError>;
}

/// Read access to registered users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
}
