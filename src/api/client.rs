//! Poloniex public REST client
//!
//! Every request goes through the rate limiter. Poloniex reports logical
//! failures (unknown pair, bad parameters) as `{"error": "..."}` with a 200
//! status, so the body is inspected before it is decoded.

use super::types::{ChartCandle, ChartPeriod, Currency, Pair, Trade};
use super::{ApiError, CurrencySource, RateLimiter, TradeSource};
use crate::telemetry::{self, CounterMetric, LatencyMetric};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Poloniex public API URL
pub const POLONIEX_API_URL: &str = "https://poloniex.com/public";

/// Maximum trades returned by one `returnTradeHistory` call
pub const TRADE_HISTORY_LIMIT: usize = 50_000;

/// Configuration for the Poloniex client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Public endpoint URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Result count at which a trade history response counts as truncated
    pub trade_limit: usize,
    /// Calls allowed per rate window
    pub max_calls: u32,
    /// Rate window length
    pub rate_window: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: POLONIEX_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            trade_limit: TRADE_HISTORY_LIMIT,
            max_calls: 6,
            rate_window: Duration::from_secs(1),
        }
    }
}

/// Client for the Poloniex public API
#[derive(Debug)]
pub struct PoloniexClient {
    config: ClientConfig,
    client: Client,
    limiter: RateLimiter,
}

impl PoloniexClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        let limiter = RateLimiter::new(config.max_calls, config.rate_window)?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue a public API command and decode the response
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.limiter.acquire().await;

        tracing::debug!(command, ?params, "Calling Poloniex API");
        telemetry::increment(CounterMetric::ApiRequests, 1);
        let started = Instant::now();

        let result = self.send(command, params).await;

        telemetry::record_latency(LatencyMetric::ApiRequest, started.elapsed());
        if let Err(e) = &result {
            telemetry::increment(CounterMetric::ApiErrors, 1);
            tracing::debug!(command, error = %e, "Poloniex API call failed");
        }

        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("command", command)])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let body = response.text().await?;
        decode_body(&body)
    }

    /// List all currencies keyed by symbol
    pub async fn get_currencies(&self) -> Result<BTreeMap<String, Currency>, ApiError> {
        self.fetch("returnCurrencies", &[]).await
    }

    /// Fetch exchange-aggregated candles.
    ///
    /// `period` is in seconds and must be one of the values in
    /// [`ChartPeriod`]; anything else fails without contacting the exchange.
    pub async fn get_chart_data(
        &self,
        pair: &Pair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: u32,
    ) -> Result<Vec<ChartCandle>, ApiError> {
        let period = ChartPeriod::try_from(period)?;

        let candles: Vec<ChartCandle> = self
            .fetch(
                "returnChartData",
                &[
                    ("currencyPair", pair.to_string()),
                    ("start", start.timestamp().to_string()),
                    ("end", end.timestamp().to_string()),
                    ("period", period.seconds().to_string()),
                ],
            )
            .await?;

        // An empty range comes back as a single all-zero row
        Ok(candles
            .into_iter()
            .filter(|c| c.date.timestamp() != 0)
            .collect())
    }

    /// Fetch trades in the half-open window `[start, end)`, oldest first.
    ///
    /// Fails with [`ApiError::TradesExceeded`] when the exchange returns as
    /// many trades as it ever will for one call, since the window is then
    /// likely truncated.
    pub async fn get_trade_history(
        &self,
        pair: &Pair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Trade>, ApiError> {
        // The exchange treats `end` as inclusive, in whole seconds
        let last_second = if end.timestamp_subsec_nanos() == 0 {
            end.timestamp() - 1
        } else {
            end.timestamp()
        };

        let mut trades: Vec<Trade> = self
            .fetch(
                "returnTradeHistory",
                &[
                    ("currencyPair", pair.to_string()),
                    ("start", start.timestamp().to_string()),
                    ("end", last_second.to_string()),
                ],
            )
            .await?;

        if trades.len() >= self.config.trade_limit {
            return Err(ApiError::TradesExceeded {
                count: trades.len(),
                limit: self.config.trade_limit,
            });
        }

        trades.retain(|t| t.timestamp >= start && t.timestamp < end);
        trades.sort_by_key(Trade::sequence_key);

        tracing::debug!(
            pair = %pair,
            start = %start,
            end = %end,
            count = trades.len(),
            "Fetched trade history"
        );

        Ok(trades)
    }
}

#[async_trait]
impl TradeSource for PoloniexClient {
    async fn trade_history(
        &self,
        pair: &Pair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Trade>, ApiError> {
        self.get_trade_history(pair, start, end).await
    }
}

#[async_trait]
impl CurrencySource for PoloniexClient {
    async fn currencies(&self) -> Result<BTreeMap<String, Currency>, ApiError> {
        self.get_currencies().await
    }
}

/// Decode a response body, surfacing `{"error": ...}` payloads
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    if let Some(error) = value.as_object().and_then(|obj| obj.get("error")) {
        let message = match error {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(ApiError::Request(message));
    }

    Ok(serde_json::from_value(value)?)
}
