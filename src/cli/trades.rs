//! Trades command implementation

use super::parse_time;
use crate::api::{Pair, PoloniexClient};
use crate::candle::Resampler;
use crate::config::Config;
use crate::history::TradeHistoryFetcher;
use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct TradesArgs {
    /// Currency pair, e.g. USDT_ETH
    #[arg(short, long)]
    pub pair: Pair,

    #[arg(long, value_parser = parse_time)]
    pub start: DateTime<Utc>,

    /// End of the window (exclusive)
    #[arg(long, value_parser = parse_time)]
    pub end: DateTime<Utc>,

    /// Print raw trades instead of bars
    #[arg(long)]
    pub raw: bool,

    /// Also print bars without trades
    #[arg(long)]
    pub all: bool,
}

impl TradesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let resampler = Resampler::new(config.bar_width())?;
        let client = PoloniexClient::with_config(config.client_config())?;
        let fetcher = TradeHistoryFetcher::with_config(client, config.fetcher_config());

        let trades = fetcher.fetch(&self.pair, self.start, self.end).await?;
        tracing::info!(pair = %self.pair, count = trades.len(), "Fetched trades");

        if self.raw {
            for t in &trades {
                println!(
                    "{}  {:>12} {:?} rate={} amount={} total={}",
                    t.timestamp, t.global_trade_id, t.side, t.rate, t.amount, t.total
                );
            }
            return Ok(());
        }

        let set = resampler.resample(&trades, self.start, self.end);
        println!(
            "{} trades -> {} bars ({} with trades), volume {}",
            trades.len(),
            set.len(),
            set.traded().count(),
            set.volume()
        );

        for bar in set.bars.iter().filter(|b| self.all || !b.is_empty()) {
            println!(
                "{}  o={} h={} l={} c={} v={}",
                bar.start.format("%Y-%m-%d %H:%M"),
                price(bar.open),
                price(bar.high),
                price(bar.low),
                price(bar.close),
                bar.volume
            );
        }

        Ok(())
    }
}

fn price(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |d| d.to_string())
}
