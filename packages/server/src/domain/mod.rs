//! Domain layer for direct messaging.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod conversation;
pub mod entity;
pub mod error;
pub mod factory;
pub mod identity;
pub mod repository;
pub mod value_object;

pub use conversation::summarize_conversations;
pub use entity::{
    ConversationSummary, Message, MessageWithParticipants, NewMessage, UserProfile, UserSummary,
};
pub use error::{IdentityError, MessageError, RepositoryError, ValueObjectError};
pub use factory::MessageIdFactory;
pub use identity::IdentityVerifier;
pub use repository::{MessageRepository, UserRepository};
pub use value_object::{MessageContent, MessageId, RoomKey, Timestamp, UserId};
