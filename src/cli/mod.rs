//! Command-line parsing for the DeFi vs TradFi spread tracker.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! fetching and reconciliation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_MONTHS_BACK, PoolSelector};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spread", version, about = "DeFi stablecoin yields vs TradFi risk-free rates")]
pub struct Cli {
    /// Log progress to stderr (`RUST_LOG` overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, reconcile and summarize the spread history; optionally export.
    Spread(SpreadArgs),
    /// Print current DeFi APYs next to the benchmarks.
    Rates(SourceArgs),
    /// Print a previously exported report JSON.
    Show(ShowArgs),
    /// Serve the JSON endpoint over HTTP.
    Serve(ServeArgs),
}

/// Where data comes from and which pools to track.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// History window in calendar months.
    #[arg(short = 'm', long = "months", default_value_t = DEFAULT_MONTHS_BACK)]
    pub months_back: u32,

    /// Pool to track as `project:SYMBOL[:chain]` (repeatable; replaces the defaults).
    #[arg(short = 'p', long = "pool", value_name = "SELECTOR")]
    pub pools: Vec<PoolSelector>,

    /// Use deterministic offline data generated from this seed.
    #[arg(long, value_name = "SEED")]
    pub sample: Option<u64>,
}

/// Options for `spread spread`.
#[derive(Debug, Args, Clone)]
pub struct SpreadArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the most recent N reconciled rows.
    #[arg(long, default_value_t = 10)]
    pub tail: usize,

    /// Export reconciled rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full report to JSON (reload with `spread show`).
    #[arg(long = "export-report")]
    pub export_report: Option<PathBuf>,
}

/// Options for printing a saved report.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Report JSON produced by `spread spread --export-report`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Print the most recent N reconciled rows.
    #[arg(long, default_value_t = 10)]
    pub tail: usize,
}

/// Options for the HTTP server.
#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}
