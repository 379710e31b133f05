mod adapter;
mod cli;
mod convert;
mod error_handling;
mod grammar;
mod graph;
mod parser;
mod projector;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = cli::Cli::parse();
    init_logging(cli.log_level());

    if let Err(error) = convert::convert(&cli.config()) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
