// External crates
use clap::Parser;
use tracing::error;

// Internal imports
use gs_messages::{msg, MESSAGES};

// Local modules
mod cli;
mod commands;
mod config;

use cli::Args;
use commands::execute_command;

#[tokio::main]
async fn main() {
    let log_guard = gs_logging::init_subscriber();

    let args = Args::parse();

    if let Err(e) = execute_command(args).await {
        error!(error = ?e, "Command failed");
        eprintln!("{}", msg!(MESSAGES.error_generic, error = format!("{e:#}")));
        // Flush file logs before exiting.
        drop(log_guard);
        std::process::exit(1);
    }
}
