// trustsync — Application Entry Point
//
// Parses CLI arguments, initializes structured logging, and dispatches to
// the command handler. Uses the tokio async runtime so network fetches and
// file writes are ordinary suspension points.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use trustsync::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    // Initialize tracing with env filter (RUST_LOG=trustsync=debug for
    // verbose output). The default level is `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trustsync=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
