//! Binary entry point: parse arguments, initialize logging, dispatch.
//!
//! Logging uses env_logger with `RUST_LOG` (default `info`). Any error
//! that escapes a command is printed and mapped to exit code 1.

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use shorereel_cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Ingest(args) => {
            shorereel_cli::commands::ingest::run(args).map(|report| {
                info!(
                    "Done: {} processed, {} duplicate(s), {} failed",
                    report.processed, report.duplicates, report.failed
                );
            })
        }
        Commands::Reconcile(args) => {
            shorereel_cli::commands::reconcile::run(args).map(|outcome| {
                info!(
                    "Done: {} became ready, {} pending, {} errored",
                    outcome.became_ready, outcome.pending, outcome.errored
                );
            })
        }
        Commands::Fetch(args) => shorereel_cli::commands::fetch::run(args).map(|report| {
            info!(
                "Done: {} processed, {} duplicate(s), {} failed",
                report.processed, report.duplicates, report.failed
            );
        }),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
