//! Realtime connection component: connection handles, presence and rooms.

pub mod connection;
pub mod hub;
pub mod presence;
pub mod rooms;

pub use connection::{ConnectionHandle, ConnectionId};
pub use hub::ConnectionHub;
pub use presence::{ConnectOutcome, DEFAULT_OFFLINE_GRACE, DisconnectOutcome, PresenceRegistry};
pub use rooms::RoomRegistry;
