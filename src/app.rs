//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds the data collaborators (live or sample)
//! - runs the spread pipeline and prints reports
//! - writes optional exports or serves the HTTP endpoint

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::api::ApiState;
use crate::cli::{Command, ServeArgs, ShowArgs, SourceArgs, SpreadArgs};
use crate::data::{DefiLlamaClient, FredClient, PoolYieldSource, RiskFreeRateSource, SampleSource};
use crate::domain::{PoolSelector, SpreadConfig};
use crate::error::AppError;
use crate::window::{Clock, SystemClock};

pub mod pipeline;

/// Calendar days of synthetic history generated for `--sample` runs.
const SAMPLE_DAYS: u32 = 800;

/// Entry point for the `spread` binary.
pub fn run() -> Result<(), AppError> {
    // `spread` and `spread --months 6` behave like `spread spread ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Io(format!("Failed to start async runtime: {e}")))?;

    match cli.command {
        Command::Spread(args) => runtime.block_on(handle_spread(args)),
        Command::Rates(args) => runtime.block_on(handle_rates(args)),
        Command::Show(args) => handle_show(args),
        Command::Serve(args) => runtime.block_on(handle_serve(args)),
    }
}

/// Logs go to stderr so stdout stays clean for reports.
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn handle_spread(args: SpreadArgs) -> Result<(), AppError> {
    let config = spread_config_from_args(&args);
    let clock = SystemClock;
    let (pools, rates) = build_sources(&args.source, &clock)?;

    let report = pipeline::run_spread(pools.as_ref(), rates.as_ref(), &clock, &config).await?;

    println!("{}", crate::report::format_run_summary(&report));
    println!("{}", crate::report::format_rates_table(&report.current));
    println!("{}", crate::report::format_series_tail(&report.points, config.tail));

    if let Some(path) = &config.export_series {
        crate::io::write_series_csv(path, &report.points)?;
    }
    if let Some(path) = &config.export_report {
        crate::io::write_report_json(path, &report)?;
    }

    Ok(())
}

async fn handle_rates(args: SourceArgs) -> Result<(), AppError> {
    let config = SpreadConfig {
        months_back: args.months_back,
        pools: selectors_or_default(&args.pools),
        sample_seed: args.sample,
        ..SpreadConfig::default()
    };
    let clock = SystemClock;
    let (pools, rates) = build_sources(&args, &clock)?;

    let current = pipeline::fetch_current_rates(pools.as_ref(), rates.as_ref(), &clock, &config).await?;
    println!("{}", crate::report::format_rates_table(&current));
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let report = crate::io::read_report_json(&args.report)?;

    println!("{}", crate::report::format_run_summary(&report));
    println!("{}", crate::report::format_rates_table(&report.current));
    println!("{}", crate::report::format_series_tail(&report.points, args.tail));
    Ok(())
}

async fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let config = SpreadConfig {
        months_back: args.source.months_back,
        pools: selectors_or_default(&args.source.pools),
        sample_seed: args.source.sample,
        ..SpreadConfig::default()
    };
    let clock = SystemClock;
    let (pools, rates) = build_sources(&args.source, &clock)?;

    let state = ApiState::new(pools, rates, Arc::new(clock), config);
    crate::api::serve(&args.host, args.port, state).await
}

/// Live HTTP clients, or one shared sample source when `--sample` is set.
fn build_sources(
    args: &SourceArgs,
    clock: &dyn Clock,
) -> Result<(Arc<dyn PoolYieldSource>, Arc<dyn RiskFreeRateSource>), AppError> {
    if let Some(seed) = args.sample {
        tracing::info!(seed, "using sample data");
        let source = Arc::new(SampleSource::new(seed, clock.today(), SAMPLE_DAYS));
        let pools: Arc<dyn PoolYieldSource> = source.clone();
        let rates: Arc<dyn RiskFreeRateSource> = source;
        return Ok((pools, rates));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("defi-spread/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {e}")))?;

    let pools: Arc<dyn PoolYieldSource> = Arc::new(DefiLlamaClient::from_env(client.clone()));
    let rates: Arc<dyn RiskFreeRateSource> = Arc::new(FredClient::from_env(client));
    Ok((pools, rates))
}

fn selectors_or_default(pools: &[PoolSelector]) -> Vec<PoolSelector> {
    if pools.is_empty() {
        PoolSelector::defaults()
    } else {
        pools.to_vec()
    }
}

pub fn spread_config_from_args(args: &SpreadArgs) -> SpreadConfig {
    SpreadConfig {
        months_back: args.source.months_back,
        pools: selectors_or_default(&args.source.pools),
        sample_seed: args.source.sample,
        tail: args.tail,
        export_series: args.export.clone(),
        export_report: args.export_report.clone(),
    }
}

/// Make the `spread` subcommand implicit.
///
/// A bare invocation or one starting with a run flag (`--sample 7`) gets
/// `spread` inserted. Help/version flags and named subcommands pass through,
/// as does any unknown word so clap can report it.
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(first) = argv.get(1).cloned() else {
        argv.push("spread".to_string());
        return argv;
    };

    let passes_through = matches!(
        first.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help" | "spread" | "rates" | "show" | "serve"
    );
    if !passes_through && first.starts_with('-') {
        argv.insert(1, "spread".to_string());
    }
    argv
}
