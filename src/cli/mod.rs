//! CLI interface for poloniex-bundle
//!
//! Provides subcommands for:
//! - `ingest`: Ingest a bundle into Parquet bar files
//! - `currencies`: List currencies known to the exchange
//! - `chart`: Show exchange-aggregated candles
//! - `trades`: Fetch trades and show the resampled bars
//! - `bundles`: List registered bundles
//! - `config`: Show configuration

mod chart;
mod currencies;
mod ingest;
mod trades;

pub use chart::ChartArgs;
pub use currencies::CurrenciesArgs;
pub use ingest::IngestArgs;
pub use trades::TradesArgs;

use crate::config::Config;
use crate::ingest::{Bundle, BundleRegistry};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poloniex-bundle")]
#[command(about = "Ingest Poloniex trade history as minute OHLCV bars")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a bundle into Parquet bar files
    Ingest(IngestArgs),
    /// List currencies known to the exchange
    Currencies(CurrenciesArgs),
    /// Show exchange-aggregated candles
    Chart(ChartArgs),
    /// Fetch trades and show the resampled bars
    Trades(TradesArgs),
    /// List registered bundles
    Bundles,
    /// Show configuration
    Config,
}

/// Default bundles plus the one described by `[ingest]`
pub fn registry(config: &Config) -> anyhow::Result<BundleRegistry> {
    let mut registry = BundleRegistry::with_defaults()?;

    if registry.bundle(&config.ingest.bundle).is_err() {
        let bundle = Bundle::new(config.ingest.pairs.clone())
            .with_range(config.ingest.start, config.ingest.end);
        registry.register(config.ingest.bundle.clone(), bundle)?;
    }

    Ok(registry)
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC)
pub fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid time {:?}, expected RFC 3339 or YYYY-MM-DD", value))
}
