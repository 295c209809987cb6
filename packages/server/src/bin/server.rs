//! Turup's Gambit server.
//!
//! Serves the pub/sub hub, the raw socket relay, the realtime fallback
//! endpoint and the user/room REST API.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin turup-server
//! cargo run --bin turup-server -- --host 0.0.0.0 --port 3000 --api-key secret
//! ```

use clap::Parser;

use turup_server::ui::{AppState, Server};
use turup_shared::{config::BACKEND_KEY_VAR, logger::setup_logger};

#[derive(Parser, Debug)]
#[command(name = "turup-server")]
#[command(about = "Realtime glue server for Turup's Gambit", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// API key hub clients must present (defaults to TURUP_BACKEND_KEY; no check when neither is set)
    #[arg(short = 'k', long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let api_key = args
        .api_key
        .or_else(|| std::env::var(BACKEND_KEY_VAR).ok())
        .filter(|key| !key.is_empty());

    if api_key.is_none() {
        tracing::warn!("No --api-key given; hub connections are not authenticated");
    }

    let server = Server::new(AppState::in_memory(api_key));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
