use clap::Parser;
use poloniex_bundle::cli::{self, Cli, Commands};
use poloniex_bundle::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _telemetry = poloniex_bundle::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Ingest(args) => {
            tracing::info!("Starting bundle ingest");
            args.execute(&config).await?;
        }
        Commands::Currencies(args) => args.execute(&config).await?,
        Commands::Chart(args) => args.execute(&config).await?,
        Commands::Trades(args) => args.execute(&config).await?,
        Commands::Bundles => {
            let registry = cli::registry(&config)?;
            for (name, bundle) in registry.bundles() {
                let pairs: Vec<String> = bundle.pairs.iter().map(|p| p.to_string()).collect();
                let bound = |t: Option<chrono::DateTime<chrono::Utc>>| {
                    t.map_or_else(|| "session".to_string(), |t| t.to_rfc3339())
                };
                println!(
                    "{:<16} {} .. {}  [{}] {}",
                    name,
                    bound(bundle.start),
                    bound(bundle.end),
                    bundle.calendar_name,
                    pairs.join(",")
                );
            }
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  API: {} (timeout {}s)",
                config.api.base_url, config.api.timeout_secs
            );
            println!(
                "  Rate limit: {} calls / {}s",
                config.rate_limit.max_calls, config.rate_limit.window_secs
            );
            println!(
                "  Retry: {} retries, {}ms..{}ms backoff",
                config.retry.max_retries,
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms
            );
            println!(
                "  Ingest: bundle={}, {} pairs, bar={}s, chunks/day={}",
                config.ingest.bundle,
                config.ingest.pairs.len(),
                config.ingest.bar_width_secs,
                config.ingest.chunks_per_day
            );
            println!("  Output: {}", config.data.output_dir.display());
            println!(
                "  Telemetry: level={}, format={:?}, metrics={:?}",
                config.telemetry.log_level,
                config.telemetry.log_format,
                config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
