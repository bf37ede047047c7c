//! UseCase 層のエラー定義
//!
//! 各ユースケースの失敗をバリデーション・未検出・認可・永続化に分類します。
//! `client_message()` はクライアントへ返す `messageError` の文言です。

use thiserror::Error;

use crate::domain::IdentityError;

/// 接続確立のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// userId クエリパラメータが無い
    #[error("connection request carries no user id")]
    MissingUserId,

    /// ID 基盤が接続を拒否した
    #[error("identity rejected: {0}")]
    Rejected(#[from] IdentityError),
}

/// メッセージ送信のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("invalid message data: {0}")]
    Validation(String),

    #[error("receiver '{0}' not found")]
    ReceiverNotFound(String),

    #[error("failed to persist message: {0}")]
    Persistence(String),
}

impl SendMessageError {
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid message data",
            Self::ReceiverNotFound(_) => "Receiver not found",
            Self::Persistence(_) => "Failed to send message",
        }
    }
}

/// 既読処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkAsReadError {
    #[error("invalid message id: {0}")]
    Validation(String),

    #[error("message '{0}' not found")]
    NotFound(String),

    #[error("user '{actor}' may not mark message '{message_id}' as read")]
    Unauthorized { actor: String, message_id: String },

    #[error("failed to persist read flag: {0}")]
    Persistence(String),
}

impl MarkAsReadError {
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid message id",
            Self::NotFound(_) => "Message not found",
            Self::Unauthorized { .. } => "Unauthorized",
            Self::Persistence(_) => "Failed to mark message as read",
        }
    }
}

/// 会話履歴・会話一覧取得のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("invalid user id: {0}")]
    Validation(String),

    #[error("failed to load messages: {0}")]
    Persistence(String),
}
