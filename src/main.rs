//! Main entry point for tabinspect CLI

use clap::Parser;
use tabinspect::cli::Cli;
use tabinspect::commands::execute_command;

fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    if let Err(e) = execute_command(cli.command, cli.config.as_deref(), cli.format) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
