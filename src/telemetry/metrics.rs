//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    /// HTTP requests sent to the exchange
    ApiRequests,
    /// Requests that failed for any reason
    ApiErrors,
    /// Retries after transient failures
    Retries,
    /// Trade history windows split after overflow
    WindowSplits,
    /// Trades received from the exchange
    TradesFetched,
    /// Asset-days served from the cache
    CacheHits,
    /// Asset-days fetched and resampled
    CacheMisses,
    /// Bars persisted by a bar writer
    BarsWritten,
}

impl CounterMetric {
    /// Exported metric name
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::ApiRequests => "poloniex_api_requests_total",
            CounterMetric::ApiErrors => "poloniex_api_errors_total",
            CounterMetric::Retries => "poloniex_api_retries_total",
            CounterMetric::WindowSplits => "poloniex_trade_window_splits_total",
            CounterMetric::TradesFetched => "poloniex_trades_fetched_total",
            CounterMetric::CacheHits => "poloniex_cache_hits_total",
            CounterMetric::CacheMisses => "poloniex_cache_misses_total",
            CounterMetric::BarsWritten => "poloniex_bars_written_total",
        }
    }
}

/// Latency metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyMetric {
    /// Round trip of one API request
    ApiRequest,
}

impl LatencyMetric {
    /// Exported metric name
    pub fn name(self) -> &'static str {
        match self {
            LatencyMetric::ApiRequest => "poloniex_api_request_latency_ms",
        }
    }
}

/// Install the Prometheus exporter on `0.0.0.0:port`
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))
}

/// Increment a counter
pub fn increment(metric: CounterMetric, value: u64) {
    ::metrics::counter!(metric.name()).increment(value);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    ::metrics::histogram!(metric.name()).record(duration.as_secs_f64() * 1000.0);
}
