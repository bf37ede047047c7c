//! Router construction and server startup.

use std::{future::Future, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    error::ServerError,
    infrastructure::{
        InMemoryIdentityVerifier, Seed,
        realtime::{ConnectionHub, DEFAULT_OFFLINE_GRACE},
        repository::{InMemoryMessageRepository, InMemoryUserRepository},
    },
    ui::{
        handler::{get_conversations, get_messages, health_check, send_message, websocket_handler},
        signal::shutdown_signal,
        state::AppState,
    },
};

/// Server settings assembled from the command line
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Delay before an `offline` status is broadcast after a disconnect
    pub offline_grace: Duration,
    /// JSON file of users and bearer tokens
    pub seed: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            offline_grace: DEFAULT_OFFLINE_GRACE,
            seed: None,
        }
    }
}

/// Wire the in-memory stores, identity service and connection hub together
pub fn build_state(seed: Seed, offline_grace: Duration) -> Arc<AppState> {
    let users = Arc::new(InMemoryUserRepository::with_users(seed.users));
    let identity = InMemoryIdentityVerifier::new(seed.tokens, users.clone());
    Arc::new(AppState {
        messages: Arc::new(InMemoryMessageRepository::new()),
        users,
        identity: Arc::new(identity),
        hub: Arc::new(ConnectionHub::new(offline_grace)),
    })
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/messages", post(send_message))
        .route("/api/messages/conversations", get(get_conversations))
        .route("/api/messages/{user_id}", get(get_messages))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let seed = match &config.seed {
        Some(path) => {
            let seed = Seed::load(path).map_err(|source| ServerError::Seed {
                path: path.clone(),
                source,
            })?;
            tracing::info!(
                path = %path.display(),
                users = seed.users.len(),
                tokens = seed.tokens.len(),
                "loaded seed file"
            );
            seed
        }
        None => {
            tracing::warn!("no seed file given, no user can connect");
            Seed::default()
        }
    };
    let state = build_state(seed, config.offline_grace);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", config.host, config.port)))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        offline_grace_ms = config.offline_grace.as_millis() as u64,
        "listening"
    );

    serve(listener, state, shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}
