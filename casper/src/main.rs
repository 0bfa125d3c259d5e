//! Casper - Entry Point
//!
//! Command line client for Cloud Deploy.

use clap::Parser;

use casper::cli::output::print_error;
use casper::cli::{run, Cli};
use casper::logs::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.global.no_color {
        colored::control::set_override(false);
    }

    // Initialize logging before reading settings so config warnings show
    if let Err(e) = init_logging(cli.global.log_options()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = run(cli).await {
        print_error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}
