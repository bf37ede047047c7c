//! Kizuna direct messaging server.
//!
//! Presence, conversation rooms, message delivery with acknowledgements,
//! typing indicators and read receipts over WebSocket, plus a small HTTP API
//! for history and conversation lists.

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use error::ServerError;
pub use ui::{ServerConfig, run as run_server};
