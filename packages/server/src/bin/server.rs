//! Broadcast chat room server.
//!
//! Every message a client sends is broadcast to all connected clients,
//! the sender included, in the order the hub receives them.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kairo-server
//! cargo run --bin kairo-server -- --host 0.0.0.0 --port 3000 --trace
//! cargo run --bin kairo-server -- --trace-file room.trace
//! ```

use std::{fs::File, path::PathBuf, sync::Arc};

use clap::Parser;
use kairo_server::{
    domain::{Hub, Tracer, tracer},
    infrastructure::{LogTracer, WriterTracer},
    ui::{
        Server,
        gate::{CookieGate, DEFAULT_LOGIN_PATH},
    },
};
use kairo_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kairo-server")]
#[command(about = "Broadcast chat room server over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Path requests without the `auth` cookie are redirected to
    #[arg(long, default_value = DEFAULT_LOGIN_PATH)]
    login_path: String,

    /// Report hub activity through the logger
    #[arg(short = 't', long)]
    trace: bool,

    /// Write hub activity to this file instead of the logger
    #[arg(long, value_name = "PATH")]
    trace_file: Option<PathBuf>,
}

/// Pick the hub's trace sink from the command line.
fn build_tracer(args: &Args) -> std::io::Result<Arc<dyn Tracer>> {
    if let Some(path) = &args.trace_file {
        tracing::info!("Writing hub trace to {}", path.display());
        return Ok(Arc::new(WriterTracer::new(File::create(path)?)));
    }
    if args.trace {
        return Ok(Arc::new(LogTracer));
    }
    Ok(tracer::off())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let tracer = match build_tracer(&args) {
        Ok(tracer) => tracer,
        Err(e) => {
            tracing::error!("Cannot open trace file: {}", e);
            std::process::exit(1);
        }
    };

    // 1. Start the room's hub
    let (hub, handle) = Hub::with_tracer(tracer);
    tokio::spawn(hub.run());

    // 2. Create and run the server
    let gate = Arc::new(CookieGate::new(args.login_path));
    let server = Server::new(handle, gate);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
