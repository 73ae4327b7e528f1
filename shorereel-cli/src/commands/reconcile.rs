//! Implementation of the `reconcile` subcommand.

use std::time::Duration;

use log::info;

use shorereel_core::{reconcile, ReconcileOptions, ReconcileOutcome};

use crate::cli::ReconcileArgs;
use crate::commands::primary_host;
use crate::error::CliResult;

pub fn run(args: &ReconcileArgs) -> CliResult<ReconcileOutcome> {
    let config = args.to_config()?;
    let host = primary_host(&config)?;

    // Without --watch a single pass runs; pending records simply wait
    // for the next invocation.
    let options = if args.watch {
        ReconcileOptions {
            attempts: args.attempts,
            delay: Duration::from_secs(args.delay),
        }
    } else {
        ReconcileOptions {
            attempts: 1,
            delay: Duration::from_secs(0),
        }
    };

    let outcome = reconcile(&config, &host, &options)?;
    if outcome.pending > 0 {
        info!(
            "{} record(s) still pending; re-run `shorereel reconcile` later",
            outcome.pending
        );
    }
    Ok(outcome)
}
