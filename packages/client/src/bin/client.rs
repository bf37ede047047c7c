//! Kizuna terminal client
//!
//! ```not_rust
//! cargo run --bin kizuna-client -- --user-id alice
//! cargo run --bin kizuna-client -- --user-id alice --api-url http://127.0.0.1:5001 --token alice-token
//! ```

use std::time::Duration;

use clap::Parser;

use kizuna_client::{ClientConfig, run_client};
use kizuna_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "kizuna-client")]
#[command(about = "Terminal client for Kizuna direct messages", long_about = None)]
struct Args {
    /// WebSocket endpoint
    #[arg(long, env = "KIZUNA_URL", default_value = "ws://127.0.0.1:5001/ws")]
    url: String,

    /// User id to connect as
    #[arg(short, long, env = "KIZUNA_USER_ID")]
    user_id: String,

    /// How long a sent message may stay unconfirmed before it is marked failed
    #[arg(long, env = "KIZUNA_SEND_TIMEOUT_MS", default_value_t = 10_000)]
    send_timeout_ms: u64,

    /// HTTP API base URL, enables /history
    #[arg(long, env = "KIZUNA_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the HTTP API
    #[arg(long, env = "KIZUNA_TOKEN")]
    token: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "KIZUNA_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        Self {
            send_timeout: Duration::from_millis(args.send_timeout_ms),
            api_url: args.api_url,
            token: args.token,
            ..ClientConfig::new(args.url, args.user_id)
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    if let Err(e) = run_client(args.into()).await {
        tracing::error!(error = %e, "client stopped");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
