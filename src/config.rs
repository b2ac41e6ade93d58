//! Configuration types for poloniex-bundle

use crate::api::{ClientConfig, Pair, RetryPolicy, POLONIEX_API_URL, TRADE_HISTORY_LIMIT};
use crate::candle::DEFAULT_BAR_WIDTH_SECS;
use crate::history::FetcherConfig;
use crate::telemetry::LogFormat;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
///
/// Every section is optional; missing sections and fields take defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub ingest: IngestConfig,
    pub data: DataConfig,
    pub telemetry: TelemetryConfig,
}

/// Exchange endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Trade history responses this large are treated as truncated
    #[serde(default = "default_trade_limit")]
    pub trade_limit: usize,
}

fn default_base_url() -> String {
    POLONIEX_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_trade_limit() -> usize {
    TRADE_HISTORY_LIMIT
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            trade_limit: default_trade_limit(),
        }
    }
}

/// Outbound request rate limit
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_calls")]
    pub max_calls: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_calls() -> u32 {
    6
}
fn default_window_secs() -> u64 {
    1
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: default_max_calls(),
            window_secs: default_window_secs(),
        }
    }
}

/// Retry policy for transient failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_multiplier() -> u32 {
    2
}
fn default_max_retries() -> u32 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            max_retries: default_max_retries(),
        }
    }
}

/// Bundle ingestion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Bundle ingested when none is named on the command line
    #[serde(default = "default_bundle")]
    pub bundle: String,

    /// Pairs of the configured bundle
    #[serde(default = "default_pairs")]
    pub pairs: Vec<Pair>,

    /// First instant to ingest (RFC 3339)
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    /// End of ingestion, exclusive (RFC 3339)
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,

    #[serde(default = "default_bar_width_secs")]
    pub bar_width_secs: i64,

    /// Sub-day chunks fetched separately per asset-day
    #[serde(default = "default_chunks_per_day")]
    pub chunks_per_day: u32,
}

fn default_bundle() -> String {
    "poloniex".to_string()
}
fn default_pairs() -> Vec<Pair> {
    Pair::KNOWN.iter().filter_map(|p| p.parse().ok()).collect()
}
fn default_bar_width_secs() -> i64 {
    DEFAULT_BAR_WIDTH_SECS
}
fn default_chunks_per_day() -> u32 {
    1
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bundle: default_bundle(),
            pairs: default_pairs(),
            start: None,
            end: None,
            bar_width_secs: default_bar_width_secs(),
            chunks_per_day: default_chunks_per_day(),
        }
    }
}

/// Output storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus exporter port; disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// HTTP client settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            trade_limit: self.api.trade_limit,
            max_calls: self.rate_limit.max_calls,
            rate_window: Duration::from_secs(self.rate_limit.window_secs),
        }
    }

    /// Retry policy for transient API failures
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
            multiplier: self.retry.multiplier,
            max_retries: self.retry.max_retries,
        }
    }

    /// Trade history fetcher settings
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            retry: self.retry_policy(),
            ..Default::default()
        }
    }

    /// Bar width of resampled bars
    pub fn bar_width(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ingest.bar_width_secs)
    }
}
