//! # Score the latest period
//! macro-regime score --data data/fred
//!
//! # Growth/inflation path over the last five years
//! macro-regime history --data data/fred --periods 60
//!
//! # Check data coverage and freshness
//! macro-regime check --data data/fred --config config/regime.toml
//!
//! # Print the default configuration
//! macro-regime config > config/regime.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use macro_regime::{EngineConfig, RawBasket, RegimeEngine};

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "macro-regime")]
#[command(about = "Macro regime scoring from economic indicator z-scores")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the latest period and print the scorecard
    Score {
        /// Path to a wide CSV file or a directory of per-indicator CSVs
        #[arg(short, long, default_value = "data/fred")]
        data: PathBuf,

        /// Path to configuration file (built-in defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the growth/inflation path and time spent in each regime
    History {
        #[arg(short, long, default_value = "data/fred")]
        data: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of trailing monthly periods
        #[arg(short, long, default_value_t = 24)]
        periods: usize,
    },

    /// Report missing, short and stale indicators
    Check {
        #[arg(short, long, default_value = "data/fred")]
        data: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as TOML
    Config,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_engine(config: Option<&Path>, data: &Path) -> Result<(RegimeEngine, RawBasket)> {
    let engine = RegimeEngine::new(load_config(config)?).context("Invalid configuration")?;
    let raw = engine
        .loader()
        .load(data)
        .with_context(|| format!("Failed to load data from {}", data.display()))?;
    info!(sources = raw.len(), path = %data.display(), "loaded indicator data");
    Ok((engine, raw))
}

fn cmd_score(config: Option<&Path>, data: &Path, json: bool) -> Result<()> {
    let (engine, raw) = load_engine(config, data)?;
    let report = engine.evaluate_raw(raw);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let as_of = report
        .verdict
        .as_of
        .map(|d| d.to_string())
        .unwrap_or_else(|| "n/a".to_string());

    println!("{}", SEPARATOR);
    println!("MACRO REGIME as of {}", as_of);
    println!("{}", SEPARATOR);
    println!("{}", report.verdict.summary());
    println!();
    println!("{}", report.scorecard.render());

    Ok(())
}

fn cmd_history(config: Option<&Path>, data: &Path, periods: usize) -> Result<()> {
    let (engine, raw) = load_engine(config, data)?;
    let set = engine.ingest(raw);
    let report = engine.evaluate(&set);
    let path = engine.axis_path(&report.normalized, periods);

    let fmt_opt = |v: Option<f64>| v.map(|x| format!("{:+.2}", x)).unwrap_or_else(|| "n/a".to_string());

    println!("{}", SEPARATOR);
    println!("{:<12} {:>8} {:>10} {:>10}  {}", "Date", "Growth", "Inflation", "Composite", "Regime");
    println!("{}", SEPARATOR);
    for point in &path {
        println!(
            "{:<12} {:>8} {:>10} {:>10}  {}",
            point.date,
            fmt_opt(point.growth_axis),
            fmt_opt(point.inflation_axis),
            fmt_opt(point.composite),
            point.regime
        );
    }

    println!("\n{}", SEPARATOR);
    for stats in RegimeEngine::path_stats(&path) {
        println!(
            "{:<12} {:>4} periods ({:.1}%)",
            stats.regime.as_str(),
            stats.periods,
            stats.pct_of_total
        );
    }

    Ok(())
}

fn cmd_check(config: Option<&Path>, data: &Path) -> Result<()> {
    let (engine, raw) = load_engine(config, data)?;
    let report = engine.check(raw);

    println!("{}", SEPARATOR);
    println!("{}", report.summary());
    println!("{}", SEPARATOR);
    for check in &report.checks {
        let status = if check.passed { "PASS" } else { "FAIL" };
        match &check.details {
            Some(details) => println!("[{}] {}: {} ({})", status, check.name, check.message, details),
            None => println!("[{}] {}: {}", status, check.name, check.message),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("macro_regime=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score { data, config, json } => cmd_score(config.as_deref(), &data, json)?,
        Commands::History { data, config, periods } => cmd_history(config.as_deref(), &data, periods)?,
        Commands::Check { data, config } => cmd_check(config.as_deref(), &data)?,
        Commands::Config => print!("{}", EngineConfig::default().to_toml_string()?),
    }

    Ok(())
}
