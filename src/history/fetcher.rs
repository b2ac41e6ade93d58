//! Overflow-safe trade history fetcher

use super::FetchError;
use crate::api::{retry_with_backoff, ApiError, Pair, RetryPolicy, Trade, TradeSource};
use crate::telemetry::{self, CounterMetric};
use chrono::{DateTime, Duration, Utc};

/// Configuration for the trade history fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Retry policy for transient API failures
    pub retry: RetryPolicy,
    /// Windows this short are not split further
    pub min_window: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            min_window: Duration::seconds(1),
        }
    }
}

/// Fetches complete trade history by bisecting windows the exchange truncates
pub struct TradeHistoryFetcher<S> {
    source: S,
    config: FetcherConfig,
}

impl<S: TradeSource> TradeHistoryFetcher<S> {
    /// Create a fetcher with default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, FetcherConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(source: S, config: FetcherConfig) -> Self {
        Self { source, config }
    }

    /// Underlying trade source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every trade in `[start, end)`, oldest first.
    ///
    /// Windows that overflow are halved into non-overlapping sub-windows and
    /// fetched again. Pending windows live on an explicit stack, left half on
    /// top, so results are appended in chronological order.
    pub async fn fetch(
        &self,
        pair: &Pair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Trade>, FetchError> {
        let mut trades = Vec::new();
        if start >= end {
            return Ok(trades);
        }

        let mut pending = vec![(start, end)];

        while let Some((lo, hi)) = pending.pop() {
            let result = retry_with_backoff(&self.config.retry, ApiError::is_transient, || {
                self.source.trade_history(pair, lo, hi)
            })
            .await;

            match result {
                Ok(batch) => {
                    telemetry::increment(CounterMetric::TradesFetched, batch.len() as u64);
                    trades.extend(
                        batch
                            .into_iter()
                            .filter(|t| t.timestamp >= lo && t.timestamp < hi),
                    );
                }
                Err(ApiError::TradesExceeded { count, .. }) => {
                    let mid = midpoint(lo, hi);
                    if hi - lo <= self.config.min_window || mid <= lo || mid >= hi {
                        return Err(FetchError::WindowTooDense { start: lo, end: hi });
                    }

                    tracing::warn!(
                        pair = %pair,
                        start = %lo,
                        end = %hi,
                        count,
                        "Trade history truncated, splitting window"
                    );
                    telemetry::increment(CounterMetric::WindowSplits, 1);

                    pending.push((mid, hi));
                    pending.push((lo, mid));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(trades)
    }
}

/// Midpoint of a window, truncated to whole seconds
fn midpoint(start: DateTime<Utc>, end: DateTime<Utc>) -> DateTime<Utc> {
    let half = (end - start).num_seconds() / 2;
    start + Duration::seconds(half)
}
