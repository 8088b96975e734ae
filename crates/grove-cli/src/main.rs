//! Grove CLI - validate bulk green-space imports.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let result = match cli.command {
        Commands::Precheck {
            file,
            delimiter,
            json,
        } => commands::precheck::run(file, delimiter, json),

        Commands::Validate(args) => commands::validate::run(args, cancel, cli.verbose).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "grove=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
