//! Terminal chat with a team of simulated colleagues.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle -- --endpoint http://localhost:8000/api/chat --participants sarah,alex
//! ```

use clap::Parser;
use huddle_client::Args;
use huddle_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    if let Err(e) = huddle_client::run(args).await {
        tracing::error!("Client error: {}", e);
        eprintln!("huddle: {e}");
        std::process::exit(1);
    }
}
