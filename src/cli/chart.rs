//! Chart command implementation

use super::parse_time;
use crate::api::{Pair, PoloniexClient};
use crate::config::Config;
use chrono::{DateTime, Utc};
use clap::Args;

#[derive(Args, Debug)]
pub struct ChartArgs {
    /// Currency pair, e.g. USDT_ETH
    #[arg(short, long)]
    pub pair: Pair,

    #[arg(long, value_parser = parse_time)]
    pub start: DateTime<Utc>,

    #[arg(long, value_parser = parse_time)]
    pub end: DateTime<Utc>,

    /// Candle period in seconds: 300, 900, 1800, 7200, 14400 or 86400
    #[arg(long, default_value_t = 1800)]
    pub period: u32,
}

impl ChartArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = PoloniexClient::with_config(config.client_config())?;
        let candles = client
            .get_chart_data(&self.pair, self.start, self.end, self.period)
            .await?;

        println!("{} candles for {}", candles.len(), self.pair);
        for c in &candles {
            println!(
                "{}  o={} h={} l={} c={} v={} wavg={}",
                c.date.format("%Y-%m-%d %H:%M"),
                c.open,
                c.high,
                c.low,
                c.close,
                c.volume,
                c.weighted_average
            );
        }

        Ok(())
    }
}
