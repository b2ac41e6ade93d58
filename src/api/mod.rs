//! Poloniex public API
//!
//! HTTP client for the unauthenticated `public` endpoint, with a
//! sliding-window rate limiter and bounded retry for transient failures.

mod client;
mod rate_limit;
pub mod retry;
mod types;

pub use client::{ClientConfig, PoloniexClient, POLONIEX_API_URL, TRADE_HISTORY_LIMIT};
pub use rate_limit::RateLimiter;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use types::{ChartCandle, ChartPeriod, Currency, Pair, Side, Trade};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Invalid configuration, detected before any network I/O
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Chart period not accepted by the exchange
    #[error("Invalid chart period {0}s, expected one of 300, 900, 1800, 7200, 14400, 86400")]
    InvalidPeriod(u32),
    /// Rate limit must allow at least one call in a non-empty window
    #[error("Invalid rate limit: {max_calls} calls per {window_ms}ms")]
    InvalidRateLimit { max_calls: u32, window_ms: u128 },
    /// Currency pair not in QUOTE_BASE form
    #[error("Invalid currency pair: {0:?}")]
    InvalidPair(String),
    /// Bar width must be a positive number of whole seconds
    #[error("Invalid bar width: {0}s")]
    InvalidBarWidth(i64),
    /// Sub-day chunking must split a day into at least one chunk
    #[error("Invalid chunks per day: {0}")]
    InvalidChunking(u32),
}

/// Errors returned by the Poloniex API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or body transfer failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// Error reported by the exchange in the response body
    #[error("Poloniex rejected request: {0}")]
    Request(String),
    /// Result set reached the exchange cap and is likely truncated
    #[error("Number of trades exceeded: {count} >= {limit}")]
    TradesExceeded { count: usize, limit: usize },
    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Rejected before any request was made
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// Source of raw trade history for a half-open `[start, end)` window
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Fetch trades ordered by timestamp ascending.
    ///
    /// Returns [`ApiError::TradesExceeded`] when the window holds more trades
    /// than the source can return in one response.
    async fn trade_history(
        &self,
        pair: &Pair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Trade>, ApiError>;
}

/// Source of the exchange's currency listing
#[async_trait]
pub trait CurrencySource: Send + Sync {
    /// Currencies keyed by symbol
    async fn currencies(&self) -> Result<BTreeMap<String, Currency>, ApiError>;
}

#[async_trait]
impl<S: TradeSource + ?Sized> TradeSource for Arc<S> {
    async fn trade_history(
        &self,
        pair: &Pair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Trade>, ApiError> {
        (**self).trade_history(pair, start, end).await
    }
}

#[async_trait]
impl<S: CurrencySource + ?Sized> CurrencySource for Arc<S> {
    async fn currencies(&self) -> Result<BTreeMap<String, Currency>, ApiError> {
        (**self).currencies().await
    }
}
