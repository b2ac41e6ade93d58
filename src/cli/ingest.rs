//! Ingest command implementation

use super::{parse_time, registry};
use crate::api::PoloniexClient;
use crate::candle::Resampler;
use crate::config::Config;
use crate::data::{ParquetAssetWriter, ParquetBarWriter};
use crate::history::TradeHistoryFetcher;
use crate::ingest::{IngestContext, Ingestor, MemoryCache};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Bundle to ingest [default: `ingest.bundle` from the config]
    #[arg(short, long)]
    pub bundle: Option<String>,

    /// First instant to ingest, overriding the bundle's range
    #[arg(long, value_parser = parse_time)]
    pub start: Option<DateTime<Utc>>,

    /// End of ingestion (exclusive), overriding the bundle's range
    #[arg(long, value_parser = parse_time)]
    pub end: Option<DateTime<Utc>>,

    /// Output directory [default: `data.output_dir` from the config]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log every asset-day as it is written
    #[arg(long)]
    pub show_progress: bool,
}

impl IngestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let registry = registry(config)?;
        let name = self.bundle.as_deref().unwrap_or(&config.ingest.bundle);

        let registered = registry.bundle(name)?;
        let bundle = registered
            .clone()
            .with_range(self.start.or(registered.start), self.end.or(registered.end));
        let calendar = registry.calendar(&bundle.calendar_name)?;

        // Without an explicit range, ingest the last complete session
        let yesterday = (Utc::now() - Duration::days(1)).date_naive();
        let sessions = calendar.session_range(yesterday, yesterday);

        let client = Arc::new(PoloniexClient::with_config(config.client_config())?);
        let fetcher = TradeHistoryFetcher::with_config(client.clone(), config.fetcher_config());
        let resampler = Resampler::new(config.bar_width())?;
        let ingestor = Ingestor::new(fetcher, resampler, config.ingest.chunks_per_day)?;

        let output_dir = self
            .output
            .clone()
            .unwrap_or_else(|| config.data.output_dir.clone())
            .join(name);
        let mut asset_writer = ParquetAssetWriter::new(output_dir.clone());
        let mut bar_writer = ParquetBarWriter::new(output_dir.clone());
        let mut cache = MemoryCache::new();

        let ctx = IngestContext {
            asset_writer: &mut asset_writer,
            bar_writer: &mut bar_writer,
            cache: &mut cache,
            sessions,
            show_progress: self.show_progress,
        };
        let assets = bundle.ingest(client.as_ref(), &ingestor, ctx).await?;

        tracing::info!(
            bundle = name,
            assets = assets.len(),
            days = cache.len(),
            dir = ?output_dir,
            "Ingest complete"
        );
        println!(
            "Ingested {} into {} ({} assets, {} asset-days)",
            name,
            output_dir.display(),
            assets.len(),
            cache.len()
        );

        Ok(())
    }
}
