//! Chat room client.
//!
//! Connects to the room with the given name as its `auth` cookie, sends
//! every input line and prints every message the room broadcasts.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kairo-client -- --name alice
//! cargo run --bin kairo-client -- -n bob -u ws://127.0.0.1:3000/room
//! ```

use clap::Parser;

use kairo_client::run_client;
use kairo_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kairo-client")]
#[command(about = "Chat room client over WebSocket", long_about = None)]
struct Args {
    /// Name presented to the server as the `auth` cookie
    #[arg(short = 'n', long)]
    name: String,

    /// WebSocket URL of the room
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/room")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run_client(args.url, args.name).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
