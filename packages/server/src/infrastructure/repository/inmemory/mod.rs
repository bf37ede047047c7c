//! InMemory Repository 実装
//!
//! プロセス内の HashMap / Vec をストレージとして使用します。
//! 再起動するとデータは失われます。

mod message;
mod user;

pub use message::InMemoryMessageRepository;
pub use user::InMemoryUserRepository;
