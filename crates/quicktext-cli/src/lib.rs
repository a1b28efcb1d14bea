pub mod cli;
pub mod commands;

use clap::Parser;
use cli::{Commands, Quicktext};
use commands::handle_command;
use std::process;

/// Run the quicktext CLI application
pub fn run_main() {
    let args = Quicktext::parse();

    // The monitoring commands log their activity; one-shot commands only report problems
    let default_filter = match args.command {
        Commands::Run { .. } | Commands::DaemonWorker => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = handle_command(args.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
