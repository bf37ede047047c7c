//! Server state and connection parameters.

use serde::Deserialize;
use std::sync::Arc;

use crate::{
    domain::{IdentityVerifier, MessageRepository, UserRepository},
    infrastructure::realtime::ConnectionHub,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Shared application state
pub struct AppState {
    /// Durable message log
    pub messages: Arc<dyn MessageRepository>,
    /// Registered users
    pub users: Arc<dyn UserRepository>,
    /// Bearer token and connection identity checks
    pub identity: Arc<dyn IdentityVerifier>,
    /// Presence registry and conversation rooms
    pub hub: Arc<ConnectionHub>,
}
