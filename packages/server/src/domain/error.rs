//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId validation error
    #[error("UserId cannot be empty")]
    UserIdEmpty,

    /// UserId too long error
    #[error("UserId cannot exceed {max} characters (got {actual})")]
    UserIdTooLong { max: usize, actual: usize },

    /// MessageId validation error
    #[error("MessageId cannot be empty")]
    MessageIdEmpty,

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },
}

/// Errors raised by the Message entity
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Only the receiver may flip the read flag
    #[error("user '{actor}' is not the receiver of message '{message_id}'")]
    NotReceiver { actor: String, message_id: String },
}

/// Errors raised by repository implementations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The record to update does not exist
    #[error("message '{0}' not found")]
    MessageNotFound(String),

    /// The backing store could not be reached or rejected the operation
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the identity service
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// No credential was presented
    #[error("no credential provided")]
    MissingCredential,

    /// The credential is malformed or unknown
    #[error("invalid credential")]
    InvalidCredential,

    /// The credential resolved to a user that does not exist
    #[error("user '{0}' not found")]
    UnknownUser(String),

    /// The user exists but is banned
    #[error("user '{user_id}' is banned: {reason}")]
    Banned { user_id: String, reason: String },

    /// The identity backend failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
