//! Kizuna direct messaging server.
//!
//! Serves the realtime WebSocket endpoint and the HTTP API.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kizuna-server -- --seed config/seed.example.json
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use kizuna_server::ServerConfig;
use kizuna_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "kizuna-server", version, about = "Kizuna direct messaging server")]
struct Args {
    /// Address to bind
    #[arg(long, env = "KIZUNA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "KIZUNA_PORT", default_value_t = 5001)]
    port: u16,

    /// Milliseconds to wait before broadcasting that a disconnected user is offline
    #[arg(long, env = "KIZUNA_OFFLINE_GRACE_MS", default_value_t = 5000)]
    offline_grace_ms: u64,

    /// JSON file with users and their bearer tokens
    #[arg(long, env = "KIZUNA_SEED")]
    seed: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "KIZUNA_LOG_LEVEL", default_value = "debug")]
    log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            offline_grace: Duration::from_millis(args.offline_grace_ms),
            seed: args.seed,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Run the server
    if let Err(e) = kizuna_server::run_server(args.into()).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
