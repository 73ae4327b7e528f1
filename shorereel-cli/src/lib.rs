//! Library portion of the shorereel CLI.
//!
//! Contains the argument definitions and command logic; the binary in
//! `main.rs` only parses, dispatches, and maps errors to exit codes.

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::{Cli, Commands, FetchArgs, IngestArgs, ReconcileArgs};
pub use error::CliResult;
