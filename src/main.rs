use anyhow::Result;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;
use tracing::info;

use docsearch::{cli, constants, logger};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI to get loglevel (need this before tracing init)
    let args: Vec<String> = std::env::args().collect();
    let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
    let is_json = args.iter().any(|a| a == "--json");

    let loglevel = args
        .iter()
        .position(|a| a == "-l" || a == "--loglevel")
        .and_then(|pos| args.get(pos + 1))
        .cloned()
        .unwrap_or_else(|| "info".to_string());
    let log_level = logger::LogLevel::parse(&loglevel).unwrap_or_default();

    // Cancellation token for async shutdown (MCP server, HTTP server, warm)
    let cancel_token = CancellationToken::new();
    let cancel_clone = cancel_token.clone();

    // First press: graceful shutdown via CancellationToken. Second press: force exit.
    ctrlc::set_handler(move || {
        if constants::SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            eprintln!("\n⚠️  Force shutdown!");
            std::process::exit(130);
        }
        if !is_quiet && !is_json {
            eprintln!("\n🛑 Shutting down gracefully... (press Ctrl-C again to force)");
        }
        constants::SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
        cancel_clone.cancel();
    })?;

    // mcp/serve set up console+file logging themselves in cli::run;
    // a global subscriber can only be installed once per process
    let is_mcp_or_serve = cli::is_long_running(&args);

    if !is_quiet && !is_json && !is_mcp_or_serve {
        // stderr only: stdout is reserved for program output
        logger::init_console_logger(log_level)?;
        info!(
            "Starting docsearch v{} (loglevel: {})",
            env!("CARGO_PKG_VERSION_FULL"),
            log_level.as_str()
        );
    }

    cli::run(cancel_token).await
}
