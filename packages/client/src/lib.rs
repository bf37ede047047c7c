//! Terminal client for Kizuna direct messaging.
//!
//! Messages are shown as soon as they are typed and reconciled against the
//! server's acknowledgements ([`reconcile`]). Presence and typing state are
//! kept in a [`session::ChatSession`] driven by the websocket
//! [`connection::Connection`].

pub mod app;
pub mod command;
pub mod connection;
pub mod error;
pub mod history;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod typing;

pub use app::{ClientConfig, run_client};
pub use error::ClientError;
