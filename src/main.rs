//! arbor: interactive terminal navigator for branching LLM conversations.
//!
//! Running without a subcommand opens the TUI on the saved position; the
//! subcommands expose tree and bookmark management for scripts.

use std::process::ExitCode;

use arbor::cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Logging is initialized by cli::run based on --log-level and --log-format
    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");

            // Print the cause chain in debug mode
            if std::env::var("RUST_BACKTRACE").is_ok() {
                if let Some(chain) = e.source_chain() {
                    eprintln!("Caused by: {chain}");
                }
            }

            ExitCode::from(e.exit_code() as u8)
        }
    }
}
