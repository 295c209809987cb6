//! Turup's Gambit command-line client.
//!
//! Signs in, creates or joins a room, subscribes to the room channel and
//! optionally opens the raw socket fallback. When this client hosts the room,
//! `--bots` fills free seats with bots that vote for trump automatically.
//!
//! Requires `TURUP_BACKEND_URL` and `TURUP_BACKEND_KEY` in the environment.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin turup-client -- --user-id u1 --username alice --bots 3
//! cargo run --bin turup-client -- -u u2 --username bob --room <room-id>
//! ```

use clap::Parser;

use turup_client::{ClientOptions, domain::Identity, run_client};
use turup_shared::{config::BackendConfig, logger::setup_logger};

#[derive(Parser, Debug)]
#[command(name = "turup-client")]
#[command(about = "Realtime client for Turup's Gambit rooms", long_about = None)]
struct Args {
    /// Room to join (creates a new room when omitted)
    #[arg(short = 'r', long)]
    room: Option<String>,

    /// User id (primary or external identity id)
    #[arg(short = 'u', long)]
    user_id: String,

    #[arg(long)]
    username: Option<String>,

    /// Display name
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// Number of bot seats to fill when hosting
    #[arg(short = 'b', long, default_value_t = 0)]
    bots: usize,

    /// Do not open the raw socket fallback
    #[arg(long)]
    no_socket: bool,
}

impl Args {
    fn identity(&self) -> Identity {
        Identity {
            id: self.user_id.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let backend = match BackendConfig::from_env() {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let options = ClientOptions {
        backend,
        identity: args.identity(),
        room_id: args.room.clone(),
        bots: args.bots,
        use_socket: !args.no_socket,
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
