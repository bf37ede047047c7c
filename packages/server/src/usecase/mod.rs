//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層と接続ハブを操作します。

pub mod connect_user;
pub mod conversation_history;
pub mod disconnect_user;
pub mod error;
pub mod list_conversations;
pub mod mark_as_read;
pub mod notify_typing;
mod participants;
pub mod send_message;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_user::ConnectUserUseCase;
pub use conversation_history::GetConversationHistoryUseCase;
pub use disconnect_user::DisconnectUserUseCase;
pub use error::{ConnectError, HistoryError, MarkAsReadError, SendMessageError};
pub use list_conversations::ListConversationsUseCase;
pub use mark_as_read::{MarkAsReadUseCase, ReadReceipt};
pub use notify_typing::{NotifyTypingUseCase, TypingSignal};
pub use send_message::{
    DeliveryOutcome, DeliveryReport, SendMessageCommand, SendPrivateMessageUseCase,
};
