//! HTTP and WebSocket interface of the messaging server.

pub mod auth;
pub mod error;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{ServerConfig, build_router, build_state, run, serve};
