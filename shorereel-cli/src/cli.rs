//! Command-line argument structures, defined with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Shorereel: video library ingestion tool",
    long_about = "Ingests dropped or downloaded video files into a deduplicated, \
                  provider-published media catalog."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Processes all pending intake files in the library
    Ingest(IngestArgs),
    /// Polls the provider and advances catalog records toward ready
    Reconcile(ReconcileArgs),
    /// Downloads videos by URL into the library's intake directory
    Fetch(FetchArgs),
}

#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Library root: intake files at the top level, holding areas below
    #[arg(short, long, value_name = "DIR")]
    pub library: PathBuf,

    /// Override the catalog document path (default: <LIBRARY>/catalog.json)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Analyze and classify files but upload, move, and record nothing
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct ReconcileArgs {
    /// Library root holding the catalog document
    #[arg(short, long, value_name = "DIR")]
    pub library: PathBuf,

    /// Override the catalog document path (default: <LIBRARY>/catalog.json)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Keep polling until nothing is pending or attempts are exhausted
    #[arg(long, default_value_t = false)]
    pub watch: bool,

    /// Maximum polling passes in watch mode
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub attempts: u32,

    /// Seconds to wait between polling passes in watch mode
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub delay: u64,
}

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Library root whose intake directory receives the downloads
    #[arg(short, long, value_name = "DIR")]
    pub library: PathBuf,

    /// Video URLs to download (youtube and twitter/x are supported)
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Leave the downloads in intake instead of ingesting them
    #[arg(long, default_value_t = false)]
    pub no_ingest: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ingest_with_defaults() {
        let cli = Cli::try_parse_from(["shorereel", "ingest", "--library", "/media"]).unwrap();
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.library, PathBuf::from("/media"));
                assert!(args.catalog.is_none());
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_ingest_overrides() {
        let cli = Cli::try_parse_from([
            "shorereel",
            "ingest",
            "-l",
            "/media",
            "--catalog",
            "/data/videos.json",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.catalog, Some(PathBuf::from("/data/videos.json")));
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_reconcile_watch_options() {
        let cli = Cli::try_parse_from([
            "shorereel",
            "reconcile",
            "--library",
            "/media",
            "--watch",
            "--attempts",
            "5",
            "--delay",
            "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Reconcile(args) => {
                assert!(args.watch);
                assert_eq!(args.attempts, 5);
                assert_eq!(args.delay, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reconcile_defaults_to_single_pass_settings() {
        let cli = Cli::try_parse_from(["shorereel", "reconcile", "--library", "/media"]).unwrap();
        match cli.command {
            Commands::Reconcile(args) => {
                assert!(!args.watch);
                assert_eq!(args.attempts, 10);
                assert_eq!(args.delay, 30);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn fetch_requires_at_least_one_url() {
        assert!(Cli::try_parse_from(["shorereel", "fetch", "--library", "/media"]).is_err());

        let cli = Cli::try_parse_from([
            "shorereel",
            "fetch",
            "--library",
            "/media",
            "https://youtu.be/abc",
            "https://x.com/u/status/1",
            "--no-ingest",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.urls.len(), 2);
                assert!(args.no_ingest);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
