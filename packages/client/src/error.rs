//! Client errors.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("terminal error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("connection closed")]
    Closed,

    #[error("no open chat, use /chat <user>")]
    NoActiveChat,

    #[error("message is empty")]
    EmptyMessage,

    #[error("history needs --api-url and --token")]
    HistoryUnavailable,
}
